//! Schema bootstrap for the messaging store.

use crate::types::CoreResult;
use sqlx::SqlitePool;
use tracing::info;

const DDL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        public_id TEXT NOT NULL UNIQUE,
        username TEXT NOT NULL UNIQUE,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS conversations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        public_id TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS conversation_participants (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        conversation_id INTEGER NOT NULL REFERENCES conversations(id),
        user_id INTEGER NOT NULL REFERENCES users(id),
        joined_at TEXT NOT NULL,
        UNIQUE(conversation_id, user_id)
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        public_id TEXT NOT NULL UNIQUE,
        conversation_id INTEGER NOT NULL REFERENCES conversations(id),
        sender_id INTEGER NOT NULL REFERENCES users(id),
        body TEXT NOT NULL,
        sent_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_participants_user
        ON conversation_participants(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_participants_conversation
        ON conversation_participants(conversation_id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_conversation
        ON messages(conversation_id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_sender
        ON messages(sender_id)",
];

/// Apply the idempotent bootstrap DDL to the given pool.
pub async fn bootstrap_schema(pool: &SqlitePool) -> CoreResult<()> {
    for statement in DDL {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("messaging schema bootstrapped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();

        bootstrap_schema(&pool).await.unwrap();
        bootstrap_schema(&pool).await.unwrap();

        // Tables exist and accept rows
        sqlx::query("INSERT INTO conversations (public_id, created_at) VALUES ('c1', '2024-01-01T00:00:00Z')")
            .execute(&pool)
            .await
            .unwrap();
    }
}
