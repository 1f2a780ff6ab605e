//! Threadline Messaging Crate
//!
//! The conversation and message domain core: identity resolution,
//! authorization predicates, the query shaper, and the two services that
//! expose every participant-scoped operation. Authentication, transport, and
//! user lifecycle live with external collaborators; this crate trusts a
//! resolved [`Identity`] and owns everything below it.

pub mod query;
pub mod services;
pub mod types;
pub mod utils;

pub use query::{FieldSchema, ListParams, Page, PageLimits, Shapeable};
pub use services::{ConversationService, MessageService};
pub use types::{
    ConversationDetail, ConversationOverview, CoreError, CoreResult, Identity, MessageView,
    UserSummary,
};
pub use utils::{AccessPolicy, Validator};
