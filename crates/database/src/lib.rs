//! Threadline Database Crate
//!
//! SQLite persistence for the Threadline messaging core: connection
//! management, schema bootstrap, domain entities, and the repositories the
//! services build on.

use sqlx::SqlitePool;
use threadline_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod repos;
pub mod schema;
pub mod types;

pub use connection::prepare_database;
pub use schema::bootstrap_schema;

// Re-export repositories
pub use repos::{
    ConversationRepository, MessageRepository, ParticipantRepository, UserRepository,
};

// Re-export entities
pub use entities::{
    conversation::{Conversation, CreateConversationRequest},
    message::{Message, MessageRecord},
    participant::ConversationParticipant,
    user::{CreateUserRequest, User},
};

// Re-export types
pub use types::errors::{CoreError, CoreResult};

/// Prepare a connection pool and apply the bootstrap schema.
pub async fn initialize_database(config: &DatabaseConfig) -> CoreResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| CoreError::infrastructure(e.to_string()))?;

    bootstrap_schema(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_initialize_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}", db_path.display()),
            max_connections: 1,
        };

        let pool = initialize_database(&config).await.unwrap();

        // Schema exists and accepts rows
        sqlx::query("INSERT INTO conversations (public_id, created_at) VALUES ('c1', '2024-01-01T00:00:00Z')")
            .execute(&pool)
            .await
            .unwrap();
    }
}
