mod file;
mod memory;

pub use file::FileConversationStore;
pub use memory::MemoryConversationStore;

use async_trait::async_trait;
use std::error::Error;
use std::sync::Arc;

/// Durable home of the opaque conversation handle issued by the upstream
/// assistant. Storage trouble degrades the feature (a fresh conversation per
/// session) instead of surfacing errors, so none of these operations fail.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn get(&self) -> Option<String>;
    async fn set(&self, handle: &str);
    async fn clear(&self);
}

pub fn create_conversation_store(
    store_type: &str,
    path: &str,
) -> Result<Arc<dyn ConversationStore>, Box<dyn Error + Send + Sync>> {
    match store_type.to_lowercase().as_str() {
        "memory" => Ok(Arc::new(MemoryConversationStore::new())),
        "file" => Ok(Arc::new(FileConversationStore::new(path))),
        _ => Err(Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Unsupported conversation store type: {}", store_type),
        ))),
    }
}
