use serde::{Deserialize, Serialize};

/// A conversation between two or more participants.
///
/// The participant set is held by the participation store and must never drop
/// below two members. Conversations are never hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Database primary key
    pub id: i64,
    /// Publicly accessible identifier
    pub public_id: String,
    /// Creation timestamp (RFC3339)
    pub created_at: String,
}

/// Request to create a conversation with an initial participant list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConversationRequest {
    /// Public ids of the initial participants. The acting identity is included
    /// implicitly if absent.
    pub participant_ids: Vec<String>,
    /// Optional first message, authored by the acting identity
    pub initial_message: Option<String>,
}

impl CreateConversationRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.participant_ids.is_empty() {
            return Err("Participant list cannot be empty".to_string());
        }

        if self.participant_ids.iter().any(|id| id.trim().is_empty()) {
            return Err("Participant ids cannot be blank".to_string());
        }

        if let Some(body) = &self.initial_message {
            if body.trim().is_empty() {
                return Err("Initial message cannot be empty".to_string());
            }
        }

        Ok(())
    }
}
