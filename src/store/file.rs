use async_trait::async_trait;
use log::debug;
use std::path::PathBuf;
use tokio::fs;

use super::ConversationStore;

/// File-backed store: one file, raw handle string as its whole content.
/// I/O failures are logged at debug and swallowed, so an unwritable disk
/// only costs conversation continuity.
pub struct FileConversationStore {
    path: PathBuf,
}

impl FileConversationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ConversationStore for FileConversationStore {
    async fn get(&self) -> Option<String> {
        match fs::read_to_string(&self.path).await {
            Ok(raw) => {
                let handle = raw.trim();
                if handle.is_empty() {
                    None
                } else {
                    Some(handle.to_string())
                }
            }
            Err(e) => {
                debug!("Conversation store read failed ({}): {}", self.path.display(), e);
                None
            }
        }
    }

    async fn set(&self, handle: &str) {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = fs::create_dir_all(parent).await {
                    debug!("Conversation store mkdir failed ({}): {}", parent.display(), e);
                    return;
                }
            }
        }
        if let Err(e) = fs::write(&self.path, handle).await {
            debug!("Conversation store write failed ({}): {}", self.path.display(), e);
        }
    }

    async fn clear(&self) {
        if let Err(e) = fs::remove_file(&self.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!("Conversation store clear failed ({}): {}", self.path.display(), e);
            }
        }
    }
}
