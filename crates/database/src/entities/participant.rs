use serde::{Deserialize, Serialize};

/// Membership row linking a user to a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationParticipant {
    /// Database primary key
    pub id: i64,
    pub conversation_id: i64,
    pub user_id: i64,
    /// Join timestamp (RFC3339)
    pub joined_at: String,
}
