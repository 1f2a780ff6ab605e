//! Shared types for the messaging services.

pub mod identity;
pub mod responses;

pub use identity::Identity;
pub use responses::{ConversationDetail, ConversationOverview, MessageView, UserSummary};

// Re-export the shared error taxonomy
pub use threadline_database::{CoreError, CoreResult};
