//! Domain services.

pub mod conversation_service;
pub mod message_service;

pub use conversation_service::ConversationService;
pub use message_service::MessageService;

use std::future::Future;
use std::time::Duration;

use threadline_database::{CoreError, CoreResult};

/// Bound a persistence call by the configured timeout. An elapsed timeout
/// surfaces as a retryable infrastructure failure, never as a domain error.
pub(crate) async fn with_deadline<T, F>(limit: Duration, operation: F) -> CoreResult<T>
where
    F: Future<Output = CoreResult<T>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(CoreError::infrastructure("persistence operation timed out")),
    }
}
