use bytes::Bytes;
use futures::{Stream, StreamExt};
use log::{debug, info};
use reqwest::multipart;
use reqwest::Client as HttpClient;
use std::error::Error as StdError;
use std::pin::Pin;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use url::Url;
use uuid::Uuid;

use crate::cli::Args;
use crate::error::{truncate_diagnostic, RelayError};
use crate::models::upstream::{
    extract_answer, ChatInputs, ChatMessagesRequest, ImageInput, UploadResponse,
    RESPONSE_MODE_BLOCKING, RESPONSE_MODE_STREAMING,
};

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, RelayError>> + Send>>;

/// One chat turn bound for the upstream API. `upload_file_id` is the
/// artifact returned by the upload step and is consumed by exactly one
/// chat-messages call.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub text: String,
    pub user: String,
    pub conversation_id: Option<String>,
    pub upload_file_id: Option<String>,
}

pub struct UpstreamClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl UpstreamClient {
    pub fn new(base_url: &str, api_key: String) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        Url::parse(base_url)
            .map_err(|e| format!("Invalid assistant base URL '{}': {}", base_url, e))?;
        Ok(Self {
            http: HttpClient::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Returns `None` when no API key is configured. The server still boots
    /// in that state; chat requests fail individually instead.
    pub fn from_args(args: &Args) -> Result<Option<Self>, Box<dyn StdError + Send + Sync>> {
        let api_key = match &args.assistant_api_key {
            Some(key) if !key.is_empty() => key.clone(),
            _ => return Ok(None),
        };
        Self::new(&args.assistant_base_url, api_key).map(Some)
    }

    fn upload_url(&self) -> String {
        format!("{}/v1/files/upload", self.base_url)
    }

    fn chat_url(&self) -> String {
        format!("{}/v1/chat-messages", self.base_url)
    }

    fn chat_request(&self, turn: &ChatTurn, response_mode: &'static str) -> ChatMessagesRequest {
        ChatMessagesRequest {
            query: turn.text.clone(),
            response_mode,
            user: turn.user.clone(),
            conversation_id: turn.conversation_id.clone(),
            inputs: ChatInputs {
                images: turn
                    .upload_file_id
                    .clone()
                    .map(|id| vec![ImageInput::local_file(id)]),
            },
        }
    }

    /// Pushes an image to the upstream file store and returns its id.
    pub async fn upload_file(
        &self,
        bytes: Vec<u8>,
        filename: String,
        mime_type: String,
        user: &str,
    ) -> Result<String, RelayError> {
        let request_id = Uuid::new_v4();
        info!("[{}] Uploading {} ({} bytes) for user {}", request_id, filename, bytes.len(), user);

        let part = multipart::Part::bytes(bytes)
            .file_name(filename)
            .mime_str(&mime_type)
            .map_err(|e| RelayError::BadInbound(format!("invalid image content type: {}", e)))?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("user", user.to_string())
            .text("source", "api");

        let resp = self
            .http
            .post(self.upload_url())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let detail = truncate_diagnostic(&resp.text().await.unwrap_or_default());
            return Err(RelayError::UploadFailed { status, detail });
        }

        let upload: UploadResponse = resp.json().await?;
        debug!("[{}] Upload accepted as file id {}", request_id, upload.id);
        Ok(upload.id)
    }

    /// Blocking chat call, used for turns that reference an uploaded image.
    /// The answer is extracted from whichever known response shape matches.
    pub async fn chat_blocking(&self, turn: &ChatTurn) -> Result<String, RelayError> {
        let request_id = Uuid::new_v4();
        info!("[{}] chat-messages (blocking) for user {}", request_id, turn.user);

        let resp = self
            .http
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&self.chat_request(turn, RESPONSE_MODE_BLOCKING))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(RelayError::ChatFailed {
                status,
                detail: truncate_diagnostic(&body),
            });
        }
        Ok(extract_answer(&body))
    }

    /// Streaming chat call. The upstream SSE bytes are forwarded untouched;
    /// the caller decides how to frame them for its own client.
    pub async fn chat_streaming(&self, turn: &ChatTurn) -> Result<ByteStream, RelayError> {
        let request_id = Uuid::new_v4();
        info!("[{}] chat-messages (streaming) for user {}", request_id, turn.user);

        let resp = self
            .http
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&self.chat_request(turn, RESPONSE_MODE_STREAMING))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let detail = truncate_diagnostic(&resp.text().await.unwrap_or_default());
            return Err(RelayError::ChatFailed { status, detail });
        }

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut stream = resp.bytes_stream();
            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(buf) => {
                        if tx.send(Ok(buf)).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        debug!("[{}] Upstream stream error: {}", request_id, e);
                        let _ = tx.send(Err(RelayError::Network(e))).await;
                        return;
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}
