//! Output shapes returned by the services.

use serde::{Deserialize, Serialize};
use threadline_database::{MessageRecord, User};

use crate::query::Shapeable;

/// User as surfaced in participant lists and message views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    /// Public identifier
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl UserSummary {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.public_id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
        }
    }
}

/// Conversation row as returned by listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationOverview {
    /// Public identifier
    pub id: String,
    pub created_at: String,
    pub participants: Vec<UserSummary>,
}

impl Shapeable for ConversationOverview {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "created_at" => Some(self.created_at.clone()),
            "participants" => Some(
                self.participants
                    .iter()
                    .map(|p| {
                        format!("{} {} {} {}", p.first_name, p.last_name, p.email, p.username)
                    })
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            _ => None,
        }
    }
}

/// Full conversation detail: participants plus messages, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationDetail {
    /// Public identifier
    pub id: String,
    pub created_at: String,
    pub participants: Vec<UserSummary>,
    pub messages: Vec<MessageView>,
}

/// Message as surfaced by listings and mutations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    /// Public identifier
    pub id: String,
    /// Public identifier of the owning conversation
    pub conversation: String,
    pub sender: UserSummary,
    pub body: String,
    pub sent_at: String,
    pub updated_at: String,
}

impl From<MessageRecord> for MessageView {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.public_id,
            conversation: record.conversation_public_id,
            sender: UserSummary {
                id: record.sender_public_id,
                username: record.sender_username,
                first_name: record.sender_first_name,
                last_name: record.sender_last_name,
                email: record.sender_email,
            },
            body: record.body,
            sent_at: record.sent_at,
            updated_at: record.updated_at,
        }
    }
}

impl Shapeable for MessageView {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "conversation" => Some(self.conversation.clone()),
            "sender" => Some(self.sender.id.clone()),
            "sender_name" => Some(format!(
                "{} {} {}",
                self.sender.first_name, self.sender.last_name, self.sender.username
            )),
            "body" => Some(self.body.clone()),
            "sent_at" => Some(self.sent_at.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> MessageRecord {
        MessageRecord {
            id: 1,
            public_id: "m1".to_string(),
            conversation_id: 1,
            conversation_public_id: "c1".to_string(),
            sender_id: 1,
            sender_public_id: "u1".to_string(),
            sender_username: "ada".to_string(),
            sender_first_name: "Ada".to_string(),
            sender_last_name: "Lovelace".to_string(),
            sender_email: "ada@example.com".to_string(),
            body: "hi".to_string(),
            sent_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_message_view_from_record() {
        let view = MessageView::from(sample_record());
        assert_eq!(view.id, "m1");
        assert_eq!(view.conversation, "c1");
        assert_eq!(view.sender.username, "ada");
        assert_eq!(view.sender.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_message_view_shapeable_fields() {
        let view = MessageView::from(sample_record());
        assert_eq!(view.field("conversation").unwrap(), "c1");
        assert_eq!(view.field("sender").unwrap(), "u1");
        assert!(view.field("sender_name").unwrap().contains("Lovelace"));
        assert!(view.field("unknown").is_none());
    }

    #[test]
    fn test_conversation_overview_search_blob_covers_participants() {
        let overview = ConversationOverview {
            id: "c1".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
            participants: vec![UserSummary {
                id: "u1".to_string(),
                username: "ada".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
            }],
        };

        let blob = overview.field("participants").unwrap();
        assert!(blob.contains("Lovelace"));
        assert!(blob.contains("ada@example.com"));
    }
}
