//! Repository for the participation store: which users belong to which
//! conversation. Mutations run in a single transaction so the two-participant
//! floor can never be observed violated.

use crate::entities::User;
use crate::types::{CoreError, CoreResult};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

/// Repository for conversation membership operations
pub struct ParticipantRepository {
    pool: SqlitePool,
}

fn row_to_user(row: &SqliteRow) -> CoreResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        username: row.try_get("username")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        created_at: row.try_get("created_at")?,
    })
}

impl ParticipantRepository {
    /// Create a new participant repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// All current participants of a conversation, in join order.
    pub async fn find_users_by_conversation(&self, conversation_id: i64) -> CoreResult<Vec<User>> {
        let rows = sqlx::query(
            "SELECT u.id, u.public_id, u.username, u.first_name, u.last_name, u.email, u.created_at
             FROM conversation_participants cp
             JOIN users u ON u.id = cp.user_id
             WHERE cp.conversation_id = ?
             ORDER BY cp.joined_at ASC, u.id ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_user).collect()
    }

    /// User ids of the current participants, for authorization checks.
    pub async fn participant_ids(&self, conversation_id: i64) -> CoreResult<Vec<i64>> {
        let rows = sqlx::query(
            "SELECT user_id FROM conversation_participants WHERE conversation_id = ? ORDER BY user_id ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get("user_id").map_err(Into::into))
            .collect()
    }

    /// Check whether a user currently participates in a conversation
    pub async fn is_participant(&self, conversation_id: i64, user_id: i64) -> CoreResult<bool> {
        let row = sqlx::query(
            "SELECT 1 FROM conversation_participants WHERE conversation_id = ? AND user_id = ?",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    /// Count current participants of a conversation
    pub async fn count_for_conversation(&self, conversation_id: i64) -> CoreResult<i64> {
        let row =
            sqlx::query("SELECT COUNT(*) as count FROM conversation_participants WHERE conversation_id = ?")
                .bind(conversation_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.try_get("count")?)
    }

    /// Add users to a conversation. Idempotent on already-present users; the
    /// whole batch is applied in one transaction.
    pub async fn add_many(&self, conversation_id: i64, user_ids: &[i64]) -> CoreResult<()> {
        if user_ids.is_empty() {
            return Ok(());
        }

        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for user_id in user_ids {
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

        tx.commit().await?;

        info!(
            conversation_id = conversation_id,
            added = user_ids.len(),
            "added participants to conversation"
        );

        Ok(())
    }

    /// Remove users from a conversation. The resulting participant count is
    /// checked inside the same transaction as the delete, so concurrent
    /// removals cannot race the count below two.
    pub async fn remove_many(&self, conversation_id: i64, user_ids: &[i64]) -> CoreResult<()> {
        if user_ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        let current: i64 = sqlx::query(
            "SELECT COUNT(*) as count FROM conversation_participants WHERE conversation_id = ?",
        )
        .bind(conversation_id)
        .fetch_one(&mut *tx)
        .await?
        .try_get("count")?;

        let placeholders = vec!["?"; user_ids.len()].join(", ");
        let count_sql = format!(
            "SELECT COUNT(*) as count FROM conversation_participants
             WHERE conversation_id = ? AND user_id IN ({placeholders})"
        );

        let mut count_query = sqlx::query(&count_sql).bind(conversation_id);
        for user_id in user_ids {
            count_query = count_query.bind(user_id);
        }
        let removable: i64 = count_query.fetch_one(&mut *tx).await?.try_get("count")?;

        if current - removable < 2 {
            return Err(CoreError::invalid_operation(
                "a conversation must keep at least 2 participants",
            ));
        }

        let delete_sql = format!(
            "DELETE FROM conversation_participants
             WHERE conversation_id = ? AND user_id IN ({placeholders})"
        );

        let mut delete_query = sqlx::query(&delete_sql).bind(conversation_id);
        for user_id in user_ids {
            delete_query = delete_query.bind(user_id);
        }
        delete_query.execute(&mut *tx).await?;

        tx.commit().await?;

        info!(
            conversation_id = conversation_id,
            removed = removable,
            "removed participants from conversation"
        );

        Ok(())
    }
}
