//! Repository for conversation data access operations.

use crate::entities::Conversation;
use crate::types::CoreResult;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

/// Repository for conversation database operations
pub struct ConversationRepository {
    pool: SqlitePool,
}

fn row_to_conversation(row: &SqliteRow) -> CoreResult<Conversation> {
    Ok(Conversation {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        created_at: row.try_get("created_at")?,
    })
}

impl ConversationRepository {
    /// Create a new conversation repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a conversation together with its initial participants and an
    /// optional first message, as one atomic unit.
    pub async fn create_with_participants(
        &self,
        creator_id: i64,
        participant_user_ids: &[i64],
        initial_body: Option<&str>,
    ) -> CoreResult<Conversation> {
        let public_id = cuid2::cuid();
        let now = chrono::Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("INSERT INTO conversations (public_id, created_at) VALUES (?, ?)")
            .bind(&public_id)
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        let conversation_id = result.last_insert_rowid();

        for user_id in participant_user_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO conversation_participants (conversation_id, user_id, joined_at)
                 VALUES (?, ?, ?)",
            )
            .bind(conversation_id)
            .bind(user_id)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(body) = initial_body {
            sqlx::query(
                "INSERT INTO messages (public_id, conversation_id, sender_id, body, sent_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(cuid2::cuid())
            .bind(conversation_id)
            .bind(creator_id)
            .bind(body)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            conversation_id = conversation_id,
            public_id = %public_id,
            created_by = creator_id,
            participants = participant_user_ids.len(),
            "created new conversation"
        );

        Ok(Conversation {
            id: conversation_id,
            public_id,
            created_at: now,
        })
    }

    /// Find a conversation by its public id
    pub async fn find_by_public_id(&self, public_id: &str) -> CoreResult<Option<Conversation>> {
        let row = sqlx::query(
            "SELECT id, public_id, created_at FROM conversations WHERE public_id = ?",
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_conversation).transpose()
    }

    /// All conversations where the given user currently participates, newest
    /// first.
    pub async fn find_by_user_id(&self, user_id: i64) -> CoreResult<Vec<Conversation>> {
        let rows = sqlx::query(
            "SELECT c.id, c.public_id, c.created_at
             FROM conversations c
             JOIN conversation_participants cp ON cp.conversation_id = c.id
             WHERE cp.user_id = ?
             ORDER BY c.created_at DESC, c.id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_conversation).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::CreateUserRequest;
    use crate::repos::{ParticipantRepository, UserRepository};
    use crate::schema::bootstrap_schema;
    use sqlx::sqlite::SqliteConnectOptions;
    use tempfile::TempDir;

    async fn create_test_pool() -> (SqlitePool, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test_conversations.db");

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await.unwrap();
        bootstrap_schema(&pool).await.unwrap();

        (pool, temp_dir)
    }

    async fn seed_user(pool: &SqlitePool, username: &str) -> i64 {
        let repo = UserRepository::new(pool.clone());
        repo.create(&CreateUserRequest {
            username: username.to_string(),
            first_name: username.to_string(),
            last_name: "Tester".to_string(),
            email: format!("{username}@example.com"),
        })
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_create_with_participants_and_first_message() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = ConversationRepository::new(pool.clone());
        let participants = ParticipantRepository::new(pool.clone());

        let a = seed_user(&pool, "ada").await;
        let b = seed_user(&pool, "bob").await;

        let conversation = repo
            .create_with_participants(a, &[a, b], Some("hi"))
            .await
            .unwrap();
        assert!(conversation.id > 0);

        assert_eq!(
            participants
                .count_for_conversation(conversation.id)
                .await
                .unwrap(),
            2
        );

        let message_count: i64 =
            sqlx::query("SELECT COUNT(*) as count FROM messages WHERE conversation_id = ?")
                .bind(conversation.id)
                .fetch_one(&pool)
                .await
                .unwrap()
                .try_get("count")
                .unwrap();
        assert_eq!(message_count, 1);
    }

    #[tokio::test]
    async fn test_create_without_first_message() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = ConversationRepository::new(pool.clone());

        let a = seed_user(&pool, "ada").await;
        let b = seed_user(&pool, "bob").await;

        let conversation = repo.create_with_participants(a, &[a, b], None).await.unwrap();

        let message_count: i64 =
            sqlx::query("SELECT COUNT(*) as count FROM messages WHERE conversation_id = ?")
                .bind(conversation.id)
                .fetch_one(&pool)
                .await
                .unwrap()
                .try_get("count")
                .unwrap();
        assert_eq!(message_count, 0);
    }

    #[tokio::test]
    async fn test_find_by_user_id_scopes_to_participation() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = ConversationRepository::new(pool.clone());

        let a = seed_user(&pool, "ada").await;
        let b = seed_user(&pool, "bob").await;
        let c = seed_user(&pool, "carol").await;

        repo.create_with_participants(a, &[a, b], None).await.unwrap();
        repo.create_with_participants(b, &[b, c], None).await.unwrap();

        assert_eq!(repo.find_by_user_id(a).await.unwrap().len(), 1);
        assert_eq!(repo.find_by_user_id(b).await.unwrap().len(), 2);
        assert_eq!(repo.find_by_user_id(c).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_public_id() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = ConversationRepository::new(pool.clone());

        let a = seed_user(&pool, "ada").await;
        let b = seed_user(&pool, "bob").await;

        let created = repo.create_with_participants(a, &[a, b], None).await.unwrap();
        let found = repo.find_by_public_id(&created.public_id).await.unwrap();

        assert!(found.is_some());
        assert_eq!(found.unwrap().id, created.id);

        assert!(repo.find_by_public_id("missing").await.unwrap().is_none());
    }
}
