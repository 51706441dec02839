use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Upper bound on how much of an upstream error body is echoed back.
pub const DIAGNOSTIC_LIMIT: usize = 300;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("request must include text or an image")]
    EmptyTurn,

    #[error("malformed request: {0}")]
    BadInbound(String),

    #[error("assistant API key is not configured")]
    MissingCredential,

    #[error("upstream upload failed with status {status}: {detail}")]
    UploadFailed { status: StatusCode, detail: String },

    #[error("upstream chat failed with status {status}: {detail}")]
    ChatFailed { status: StatusCode, detail: String },

    #[error("upstream request failed: {0}")]
    Network(#[from] reqwest::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::EmptyTurn | RelayError::BadInbound(_) => StatusCode::BAD_REQUEST,
            RelayError::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::UploadFailed { status, .. } => *status,
            RelayError::ChatFailed { status, .. } => *status,
            RelayError::Network(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Clips an upstream error body so diagnostics stay loggable.
pub fn truncate_diagnostic(body: &str) -> String {
    if body.len() <= DIAGNOSTIC_LIMIT {
        return body.to_string();
    }
    let mut end = DIAGNOSTIC_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
