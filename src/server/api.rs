use axum::body::Body;
use axum::extract::{Multipart, Request, State};
use axum::http::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, RequestExt, Router};
use log::debug;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::cli::Args;
use crate::error::RelayError;
use crate::relay::{ChatTurn, UpstreamClient};

#[derive(Clone)]
pub struct AppState {
    pub upstream: Option<Arc<UpstreamClient>>,
    pub default_user_id: String,
}

impl AppState {
    pub fn from_args(args: &Args) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(Self {
            upstream: UpstreamClient::from_args(args)?.map(Arc::new),
            default_user_id: args.default_user_id.clone(),
        })
    }
}

#[derive(Serialize)]
struct ChatAnswer {
    answer: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Deserialize)]
struct InboundJson {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default, alias = "conversationId")]
    conversation_id: Option<String>,
    #[serde(default, alias = "userId")]
    user_id: Option<String>,
}

#[derive(Default)]
struct InboundTurn {
    text: String,
    image: Option<InboundImage>,
    conversation_id: Option<String>,
    user_id: Option<String>,
}

struct InboundImage {
    bytes: Vec<u8>,
    filename: String,
    mime_type: String,
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// One inbound chat turn becomes one or two upstream calls: a turn with an
/// image goes upload-then-blocking-chat; a text-only turn goes straight to
/// the streaming chat endpoint and its bytes are relayed through unparsed.
async fn chat_handler(
    State(state): State<AppState>,
    req: Request,
) -> Result<Response, RelayError> {
    let inbound = parse_inbound(req).await?;

    if inbound.text.trim().is_empty() && inbound.image.is_none() {
        return Err(RelayError::EmptyTurn);
    }
    // Credential check happens before any upstream call is attempted.
    let upstream = state.upstream.clone().ok_or(RelayError::MissingCredential)?;

    let user = inbound
        .user_id
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| state.default_user_id.clone());
    let mut turn = ChatTurn {
        text: inbound.text,
        user,
        conversation_id: inbound.conversation_id.filter(|c| !c.is_empty()),
        upload_file_id: None,
    };

    match inbound.image {
        Some(image) => {
            let file_id = upstream
                .upload_file(image.bytes, image.filename, image.mime_type, &turn.user)
                .await?;
            turn.upload_file_id = Some(file_id);
            let answer = upstream.chat_blocking(&turn).await?;
            Ok(Json(ChatAnswer { answer }).into_response())
        }
        None => {
            let stream = upstream.chat_streaming(&turn).await?;
            let headers = [
                (CONTENT_TYPE, HeaderValue::from_static("text/event-stream")),
                (CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            ];
            Ok((headers, Body::from_stream(stream)).into_response())
        }
    }
}

async fn parse_inbound(req: Request) -> Result<InboundTurn, RelayError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let multipart = req
            .extract::<Multipart, _>()
            .await
            .map_err(|e| RelayError::BadInbound(e.to_string()))?;
        parse_multipart(multipart).await
    } else {
        let Json(body) = req
            .extract::<Json<InboundJson>, _>()
            .await
            .map_err(|e| RelayError::BadInbound(e.to_string()))?;
        Ok(InboundTurn {
            text: body.text.or(body.prompt).unwrap_or_default(),
            image: None,
            conversation_id: body.conversation_id,
            user_id: body.user_id,
        })
    }
}

async fn parse_multipart(mut multipart: Multipart) -> Result<InboundTurn, RelayError> {
    let mut turn = InboundTurn::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| RelayError::BadInbound(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "text" => {
                turn.text = field
                    .text()
                    .await
                    .map_err(|e| RelayError::BadInbound(e.to_string()))?;
            }
            "image" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| RelayError::BadInbound(e.to_string()))?
                    .to_vec();
                if !bytes.is_empty() {
                    turn.image = Some(InboundImage {
                        bytes,
                        filename,
                        mime_type,
                    });
                }
            }
            "conversationId" => {
                turn.conversation_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| RelayError::BadInbound(e.to_string()))?,
                )
                .filter(|s| !s.is_empty());
            }
            "userId" => {
                turn.user_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| RelayError::BadInbound(e.to_string()))?,
                )
                .filter(|s| !s.is_empty());
            }
            other => {
                debug!("Ignoring unknown form field: {}", other);
            }
        }
    }

    Ok(turn)
}
