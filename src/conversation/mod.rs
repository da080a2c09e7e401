use chrono::Utc;
use log::debug;
use thiserror::Error;
use uuid::Uuid;

use crate::models::chat::{ Message, Role };

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("message content is empty or whitespace-only")]
    EmptyContent,
}

/// Append-only log of one session's messages.
///
/// Insertion order is display order and the order replayed to the model.
/// Ids and timestamps are minted here, at append time, so they stay stable
/// for the lifetime of the session.
#[derive(Debug, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
    last_timestamp: i64,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and returns a reference to the stored record.
    ///
    /// Content must contain at least one non-whitespace character; the
    /// store never holds a blank message.
    pub fn append(&mut self, role: Role, content: &str) -> Result<&Message, ValidationError> {
        if content.trim().is_empty() {
            return Err(ValidationError::EmptyContent);
        }
        // Wall clocks can step backwards; stored timestamps must not.
        let now = Utc::now().timestamp_millis().max(self.last_timestamp);
        self.last_timestamp = now;
        self.messages.push(Message {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.to_string(),
            timestamp: now,
        });
        let message = &self.messages[self.messages.len() - 1];
        debug!("Appended {:?} message {} ({} in log)", role, message.id, self.messages.len());
        Ok(message)
    }

    /// Owned copy of the log. Mutating the copy never touches the store.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
