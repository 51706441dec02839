use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub content: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Message {
    pub fn new(id: i64, content: impl Into<String>, is_user: bool) -> Self {
        Self {
            id,
            content: content.into(),
            is_user,
            timestamp: Utc::now(),
            image_url: None,
        }
    }
}
