use serde::{Deserialize, Serialize};

pub const RESPONSE_MODE_STREAMING: &str = "streaming";
pub const RESPONSE_MODE_BLOCKING: &str = "blocking";

#[derive(Serialize, Debug)]
pub struct ChatMessagesRequest {
    pub query: String,
    pub response_mode: &'static str,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub inputs: ChatInputs,
}

#[derive(Serialize, Debug, Default)]
pub struct ChatInputs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageInput>>,
}

#[derive(Serialize, Debug)]
pub struct ImageInput {
    #[serde(rename = "type")]
    pub input_type: &'static str,
    pub transfer_method: &'static str,
    pub upload_file_id: String,
}

impl ImageInput {
    /// References a previously uploaded file in a chat-messages call.
    pub fn local_file(upload_file_id: String) -> Self {
        Self {
            input_type: "image",
            transfer_method: "local_file",
            upload_file_id,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct UploadResponse {
    pub id: String,
}

/// One decoded `data: {json}` frame from the streaming chat response.
#[derive(Deserialize, Debug, Clone)]
pub struct StreamFrame {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
}

/// Pulls the answer text out of a blocking chat response.
///
/// The upstream API returns different shapes depending on how the assistant
/// app is wired (plain chat, workflow outputs). Each known shape is tried in
/// a fixed priority order; anything unrecognized falls back to the raw body,
/// and a non-JSON body is returned as-is.
pub fn extract_answer(raw: &str) -> String {
    #[derive(Deserialize)]
    struct TopAnswer {
        answer: String,
    }
    #[derive(Deserialize)]
    struct TopResult {
        result: String,
    }
    #[derive(Deserialize)]
    struct TopText {
        text: String,
    }
    #[derive(Deserialize)]
    struct Outputs {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        result: Option<String>,
    }
    #[derive(Deserialize)]
    struct Data {
        outputs: Outputs,
    }
    #[derive(Deserialize)]
    struct Nested {
        data: Data,
    }

    if serde_json::from_str::<serde_json::Value>(raw).is_err() {
        return raw.to_string();
    }
    if let Ok(shape) = serde_json::from_str::<TopAnswer>(raw) {
        return shape.answer;
    }
    if let Ok(shape) = serde_json::from_str::<TopResult>(raw) {
        return shape.result;
    }
    if let Ok(shape) = serde_json::from_str::<TopText>(raw) {
        return shape.text;
    }
    if let Ok(shape) = serde_json::from_str::<Nested>(raw) {
        if let Some(text) = shape.data.outputs.text {
            return text;
        }
        if let Some(result) = shape.data.outputs.result {
            return result;
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_field_wins_over_result() {
        let raw = r#"{"answer":"a","result":"b","text":"c"}"#;
        assert_eq!(extract_answer(raw), "a");
    }

    #[test]
    fn result_field_wins_over_text() {
        let raw = r#"{"result":"b","text":"c"}"#;
        assert_eq!(extract_answer(raw), "b");
    }

    #[test]
    fn top_level_text_is_used() {
        assert_eq!(extract_answer(r#"{"text":"c"}"#), "c");
    }

    #[test]
    fn nested_workflow_outputs_text() {
        let raw = r#"{"data":{"outputs":{"text":"workflow says hi"}}}"#;
        assert_eq!(extract_answer(raw), "workflow says hi");
    }

    #[test]
    fn nested_workflow_outputs_result() {
        let raw = r#"{"data":{"outputs":{"result":"computed"}}}"#;
        assert_eq!(extract_answer(raw), "computed");
    }

    #[test]
    fn unknown_json_shape_falls_back_to_raw_body() {
        let raw = r#"{"status":"ok"}"#;
        assert_eq!(extract_answer(raw), raw);
    }

    #[test]
    fn non_json_body_is_returned_verbatim() {
        assert_eq!(extract_answer("plain text reply"), "plain text reply");
    }

    #[test]
    fn chat_request_omits_absent_conversation_id() {
        let req = ChatMessagesRequest {
            query: "hello".into(),
            response_mode: RESPONSE_MODE_STREAMING,
            user: "u1".into(),
            conversation_id: None,
            inputs: ChatInputs::default(),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("conversation_id"));
        assert!(!json.contains("images"));
        assert!(json.contains(r#""response_mode":"streaming""#));
    }

    #[test]
    fn image_input_carries_the_upload_id() {
        let json = serde_json::to_value(ImageInput::local_file("file-9".into())).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["transfer_method"], "local_file");
        assert_eq!(json["upload_file_id"], "file-9");
    }
}
