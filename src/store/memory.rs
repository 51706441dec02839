use async_trait::async_trait;
use tokio::sync::Mutex;

use super::ConversationStore;

/// Process-local store for tests and sessions that should not survive a
/// restart.
pub struct MemoryConversationStore {
    handle: Mutex<Option<String>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self {
            handle: Mutex::new(None),
        }
    }
}

impl Default for MemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn get(&self) -> Option<String> {
        self.handle.lock().await.clone()
    }

    async fn set(&self, handle: &str) {
        *self.handle.lock().await = Some(handle.to_string());
    }

    async fn clear(&self) {
        *self.handle.lock().await = None;
    }
}
