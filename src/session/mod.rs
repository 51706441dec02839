pub mod sse;
pub mod timeline;

use chrono::Utc;
use futures_util::StreamExt;
use log::warn;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::error::Error as StdError;
use std::sync::Arc;

use crate::models::chat::Message;
use crate::store::ConversationStore;
use sse::{SseDecoder, SseEvent};
use timeline::MessageTimeline;

/// An image attached to an outgoing message.
pub struct OutgoingImage {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
}

#[derive(Deserialize)]
struct AnswerBody {
    answer: String,
}

/// Client-side orchestration of one chat session against the relay: an
/// optimistic message timeline, incremental SSE decoding into the in-flight
/// assistant message, and first-write-wins persistence of the conversation
/// handle.
///
/// `send_message` takes `&mut self`, so one session can never have two
/// streams in flight; sends serialize naturally.
pub struct ChatSession {
    http: HttpClient,
    chat_url: String,
    user_id: String,
    store: Arc<dyn ConversationStore>,
    timeline: MessageTimeline,
    is_loading: bool,
    last_error: Option<String>,
}

impl ChatSession {
    pub fn new(relay_base_url: &str, user_id: &str, store: Arc<dyn ConversationStore>) -> Self {
        Self {
            http: HttpClient::new(),
            chat_url: format!("{}/api/chat", relay_base_url.trim_end_matches('/')),
            user_id: user_id.to_string(),
            store,
            timeline: MessageTimeline::new(),
            is_loading: false,
            last_error: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        self.timeline.messages()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Drops the timeline and the stored conversation handle; the next send
    /// starts a fresh upstream conversation.
    pub async fn new_conversation(&mut self) {
        self.timeline.clear();
        self.store.clear().await;
        self.last_error = None;
    }

    /// Sends one chat turn. The user message and an empty assistant
    /// placeholder are appended immediately; the placeholder fills in as
    /// fragments arrive. On failure the placeholder is removed outright and
    /// an error string is recorded for the caller to display.
    pub async fn send_message(&mut self, text: &str, image: Option<OutgoingImage>) {
        self.last_error = None;
        self.is_loading = true;

        let now = Utc::now().timestamp_millis();
        let mut user_message = Message::new(now, text, true);
        if let Some(image) = &image {
            user_message.image_url = Some(image.filename.clone());
        }
        self.timeline.append(user_message);

        let placeholder_id = now + 1;
        self.timeline.append(Message::new(placeholder_id, "", false));

        if let Err(e) = self.stream_turn(text, image, placeholder_id).await {
            warn!("Chat turn failed: {}", e);
            self.timeline.remove(placeholder_id);
            self.last_error =
                Some("The assistant could not be reached. Please try again.".to_string());
        }

        self.is_loading = false;
    }

    async fn stream_turn(
        &mut self,
        text: &str,
        image: Option<OutgoingImage>,
        placeholder_id: i64,
    ) -> Result<(), Box<dyn StdError + Send + Sync>> {
        let mut form = multipart::Form::new()
            .text("text", text.to_string())
            .text("userId", self.user_id.clone());
        if let Some(handle) = self.store.get().await {
            form = form.text("conversationId", handle);
        }
        if let Some(image) = image {
            let part = multipart::Part::bytes(image.bytes)
                .file_name(image.filename)
                .mime_str(&image.mime_type)?;
            form = form.part("image", part);
        }

        let resp = self.http.post(&self.chat_url).multipart(form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("relay returned {}: {}", status, body).into());
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        // Image turns come back as one JSON object instead of a stream.
        if content_type.starts_with("application/json") {
            let body: AnswerBody = resp.json().await?;
            self.timeline
                .update_by_id(placeholder_id, |m| m.content = body.answer);
            return Ok(());
        }

        let mut decoder = SseDecoder::new();
        let mut stream = resp.bytes_stream();
        'read: while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for event in decoder.push(&chunk) {
                match event {
                    SseEvent::Done => break 'read,
                    SseEvent::Frame(frame) => {
                        if let Some(handle) = frame.conversation_id {
                            // First write wins for the session.
                            if self.store.get().await.is_none() {
                                self.store.set(&handle).await;
                            }
                        }
                        if let Some(answer) = frame.answer {
                            self.timeline
                                .update_by_id(placeholder_id, |m| m.content.push_str(&answer));
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
