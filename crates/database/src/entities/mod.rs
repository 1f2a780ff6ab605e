//! Domain entities persisted by the store.

pub mod conversation;
pub mod message;
pub mod participant;
pub mod user;

pub use conversation::{Conversation, CreateConversationRequest};
pub use message::{Message, MessageRecord};
pub use participant::ConversationParticipant;
pub use user::{CreateUserRequest, User};
