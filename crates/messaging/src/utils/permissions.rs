//! Authorization predicates.
//!
//! Pure functions over the acting identity and already-fetched state,
//! evaluated by every service method before any domain logic runs.

use threadline_database::Message;

use crate::types::Identity;

/// Authorization predicates for conversations and messages
pub struct AccessPolicy;

impl AccessPolicy {
    /// Visibility and posting rights follow participation.
    pub fn is_member(identity: &Identity, participant_ids: &[i64]) -> bool {
        participant_ids.contains(&identity.user_id())
    }

    /// Message mutation rights follow authorship, not participation.
    pub fn is_sender(identity: &Identity, message: &Message) -> bool {
        message.sender_id == identity.user_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(sender_id: i64) -> Message {
        Message {
            id: 1,
            public_id: "m1".to_string(),
            conversation_id: 1,
            sender_id,
            body: "hi".to_string(),
            sent_at: "2024-01-01T00:00:00Z".to_string(),
            updated_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_is_member() {
        let identity = Identity::resolve(Some(2)).unwrap();
        assert!(AccessPolicy::is_member(&identity, &[1, 2, 3]));
        assert!(!AccessPolicy::is_member(&identity, &[1, 3]));
        assert!(!AccessPolicy::is_member(&identity, &[]));
    }

    #[test]
    fn test_is_sender() {
        let identity = Identity::resolve(Some(2)).unwrap();
        assert!(AccessPolicy::is_sender(&identity, &message(2)));
        assert!(!AccessPolicy::is_sender(&identity, &message(3)));
    }
}
