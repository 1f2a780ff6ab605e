//! Input validation helpers.

use threadline_database::{CoreError, CoreResult};

const MAX_BODY_LENGTH: usize = 100_000;
const MAX_RECENT_LIMIT: u32 = 100;
const DEFAULT_RECENT_LIMIT: u32 = 20;

/// Validation utilities
pub struct Validator;

impl Validator {
    /// Validate a message body
    pub fn message_body(body: &str) -> CoreResult<()> {
        if body.trim().is_empty() {
            return Err(CoreError::validation("message body cannot be empty"));
        }

        if body.len() > MAX_BODY_LENGTH {
            return Err(CoreError::validation(
                "message body too long (max 100,000 characters)",
            ));
        }

        Ok(())
    }

    /// Validate a user search query
    pub fn search_query(query: &str) -> CoreResult<()> {
        if query.trim().is_empty() {
            return Err(CoreError::validation("search query cannot be empty"));
        }

        Ok(())
    }

    /// Resolve the limit for a recent-messages request: default 20, cap 100,
    /// zero rejected.
    pub fn recent_limit(limit: Option<u32>) -> CoreResult<u32> {
        match limit {
            None => Ok(DEFAULT_RECENT_LIMIT),
            Some(0) => Err(CoreError::validation("limit must be a positive integer")),
            Some(limit) => Ok(limit.min(MAX_RECENT_LIMIT)),
        }
    }
}
