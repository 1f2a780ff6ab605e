//! Repository for message data access operations.

use crate::entities::{Message, MessageRecord};
use crate::types::CoreResult;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

const RECORD_COLUMNS: &str = "m.id, m.public_id, m.conversation_id, c.public_id AS conversation_public_id,
        m.sender_id, u.public_id AS sender_public_id, u.username AS sender_username,
        u.first_name AS sender_first_name, u.last_name AS sender_last_name, u.email AS sender_email,
        m.body, m.sent_at, m.updated_at";

/// Repository for message database operations
pub struct MessageRepository {
    pool: SqlitePool,
}

fn row_to_message(row: &SqliteRow) -> CoreResult<Message> {
    Ok(Message {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        conversation_id: row.try_get("conversation_id")?,
        sender_id: row.try_get("sender_id")?,
        body: row.try_get("body")?,
        sent_at: row.try_get("sent_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_record(row: &SqliteRow) -> CoreResult<MessageRecord> {
    Ok(MessageRecord {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        conversation_id: row.try_get("conversation_id")?,
        conversation_public_id: row.try_get("conversation_public_id")?,
        sender_id: row.try_get("sender_id")?,
        sender_public_id: row.try_get("sender_public_id")?,
        sender_username: row.try_get("sender_username")?,
        sender_first_name: row.try_get("sender_first_name")?,
        sender_last_name: row.try_get("sender_last_name")?,
        sender_email: row.try_get("sender_email")?,
        body: row.try_get("body")?,
        sent_at: row.try_get("sent_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl MessageRepository {
    /// Create a new message repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new message
    pub async fn create(
        &self,
        conversation_id: i64,
        sender_id: i64,
        body: &str,
    ) -> CoreResult<Message> {
        let public_id = cuid2::cuid();
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO messages (public_id, conversation_id, sender_id, body, sent_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(conversation_id)
        .bind(sender_id)
        .bind(body)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let message_id = result.last_insert_rowid();

        info!(
            message_id = message_id,
            public_id = %public_id,
            conversation_id = conversation_id,
            sender_id = sender_id,
            "created new message"
        );

        Ok(Message {
            id: message_id,
            public_id,
            conversation_id,
            sender_id,
            body: body.to_string(),
            sent_at: now.clone(),
            updated_at: now,
        })
    }

    /// Find a message by its public id
    pub async fn find_by_public_id(&self, public_id: &str) -> CoreResult<Option<Message>> {
        let row = sqlx::query(
            "SELECT id, public_id, conversation_id, sender_id, body, sent_at, updated_at
             FROM messages WHERE public_id = ?",
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_message).transpose()
    }

    /// Find a message joined with its conversation and sender
    pub async fn record_by_public_id(&self, public_id: &str) -> CoreResult<Option<MessageRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS}
             FROM messages m
             JOIN conversations c ON c.id = m.conversation_id
             JOIN users u ON u.id = m.sender_id
             WHERE m.public_id = ?"
        );

        let row = sqlx::query(&sql)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_record).transpose()
    }

    /// All messages of a conversation, newest first.
    pub async fn records_for_conversation(
        &self,
        conversation_id: i64,
    ) -> CoreResult<Vec<MessageRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS}
             FROM messages m
             JOIN conversations c ON c.id = m.conversation_id
             JOIN users u ON u.id = m.sender_id
             WHERE m.conversation_id = ?
             ORDER BY m.sent_at DESC, m.id DESC"
        );

        let rows = sqlx::query(&sql)
            .bind(conversation_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_record).collect()
    }

    /// All messages across every conversation the given user participates in,
    /// newest first.
    pub async fn records_visible_to_user(&self, user_id: i64) -> CoreResult<Vec<MessageRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS}
             FROM messages m
             JOIN conversations c ON c.id = m.conversation_id
             JOIN users u ON u.id = m.sender_id
             WHERE m.conversation_id IN (
                 SELECT conversation_id FROM conversation_participants WHERE user_id = ?
             )
             ORDER BY m.sent_at DESC, m.id DESC"
        );

        let rows = sqlx::query(&sql).bind(user_id).fetch_all(&self.pool).await?;

        rows.iter().map(row_to_record).collect()
    }

    /// Replace the body of a message. Authorization is checked by the caller.
    pub async fn update_body(&self, public_id: &str, body: &str) -> CoreResult<()> {
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query("UPDATE messages SET body = ?, updated_at = ? WHERE public_id = ?")
            .bind(body)
            .bind(&now)
            .bind(public_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Permanently delete a message. Authorization is checked by the caller.
    pub async fn delete(&self, public_id: &str) -> CoreResult<()> {
        sqlx::query("DELETE FROM messages WHERE public_id = ?")
            .bind(public_id)
            .execute(&self.pool)
            .await?;

        info!(public_id = public_id, "deleted message");

        Ok(())
    }

    /// Delete every listed message that is authored by the given user and lives
    /// in one of their conversations. A single statement, so two concurrent
    /// bulk operations cannot both count the same row.
    pub async fn bulk_delete(&self, user_id: i64, public_ids: &[String]) -> CoreResult<u64> {
        if public_ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; public_ids.len()].join(", ");
        let sql = format!(
            "DELETE FROM messages
             WHERE public_id IN ({placeholders})
               AND sender_id = ?
               AND conversation_id IN (
                   SELECT conversation_id FROM conversation_participants WHERE user_id = ?
               )"
        );

        let mut query = sqlx::query(&sql);
        for public_id in public_ids {
            query = query.bind(public_id);
        }
        let result = query.bind(user_id).bind(user_id).execute(&self.pool).await?;

        let deleted = result.rows_affected();

        info!(
            user_id = user_id,
            requested = public_ids.len(),
            deleted = deleted,
            "bulk deleted messages"
        );

        Ok(deleted)
    }
}
