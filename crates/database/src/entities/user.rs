use serde::{Deserialize, Serialize};

/// A user referenced by the messaging core. Identity lifecycle is owned by an
/// external collaborator; this core only resolves and displays users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Database primary key
    pub id: i64,
    /// Publicly accessible identifier
    pub public_id: String,
    /// Unique handle
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Creation timestamp (RFC3339)
    pub created_at: String,
}

impl User {
    /// Human-readable name, falling back to the handle when names are blank.
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

/// Request to register a user row (used for store seeding and tests)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("Username cannot be empty".to_string());
        }

        if !self.email.contains('@') {
            return Err("Invalid email format".to_string());
        }

        Ok(())
    }
}
