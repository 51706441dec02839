use crate::models::chat::Message;

/// Ordered, in-memory list of one chat session's messages. Messages are
/// mutated in place while a response streams in; order is insertion order
/// and is never changed afterwards.
#[derive(Default)]
pub struct MessageTimeline {
    messages: Vec<Message>,
}

impl MessageTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Applies `mutate` to the message with the given id; no-op when the id
    /// is not present.
    pub fn update_by_id(&mut self, id: i64, mutate: impl FnOnce(&mut Message)) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            mutate(message);
        }
    }

    pub fn remove(&mut self, id: i64) {
        self.messages.retain(|m| m.id != id);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
