//! Identity context for the acting user.

use threadline_database::{CoreError, CoreResult};

/// Opaque reference to the authenticated user a request acts as.
///
/// Resolution happens in an external authentication collaborator; this type
/// only guarantees that every service call carries a resolved identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    user_id: i64,
}

impl Identity {
    /// Build an identity from a resolved user id. Absence is an authorization
    /// failure, not a validation failure.
    pub fn resolve(user_id: Option<i64>) -> CoreResult<Self> {
        match user_id {
            Some(user_id) => Ok(Self { user_id }),
            None => Err(CoreError::Unauthenticated),
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_requires_a_user() {
        let identity = Identity::resolve(Some(7)).unwrap();
        assert_eq!(identity.user_id(), 7);

        let err = Identity::resolve(None).unwrap_err();
        assert!(matches!(err, CoreError::Unauthenticated));
    }
}
