use serde::{Deserialize, Serialize};

/// A message inside a conversation.
///
/// The conversation reference is immutable after creation and only the body may
/// be changed, solely by the sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Database primary key
    pub id: i64,
    /// Publicly accessible identifier
    pub public_id: String,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub body: String,
    /// Send timestamp (RFC3339)
    pub sent_at: String,
    /// Last edit timestamp (RFC3339)
    pub updated_at: String,
}

/// A message joined with its conversation and sender, as read by listing queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    pub public_id: String,
    pub conversation_id: i64,
    pub conversation_public_id: String,
    pub sender_id: i64,
    pub sender_public_id: String,
    pub sender_username: String,
    pub sender_first_name: String,
    pub sender_last_name: String,
    pub sender_email: String,
    pub body: String,
    pub sent_at: String,
    pub updated_at: String,
}

impl MessageRecord {
    /// Human-readable sender name, falling back to the handle.
    pub fn sender_display_name(&self) -> String {
        let full = format!("{} {}", self.sender_first_name, self.sender_last_name);
        let full = full.trim();
        if full.is_empty() {
            self.sender_username.clone()
        } else {
            full.to_string()
        }
    }
}
