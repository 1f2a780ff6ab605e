//! Repository for user data access operations.

use crate::entities::{CreateUserRequest, User};
use crate::types::{CoreError, CoreResult};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::info;

/// Repository for user database operations
pub struct UserRepository {
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

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a user row. User lifecycle is owned externally; this exists so
    /// the store can be seeded.
    pub async fn create(&self, request: &CreateUserRequest) -> CoreResult<User> {
        request.validate().map_err(CoreError::validation)?;

        let public_id = cuid2::cuid();
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO users (public_id, username, first_name, last_name, email, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(&request.username)
        .bind(&request.first_name)
        .bind(&request.last_name)
        .bind(&request.email)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let user_id = result.last_insert_rowid();

        info!(
            user_id = user_id,
            public_id = %public_id,
            username = %request.username,
            "registered user"
        );

        Ok(User {
            id: user_id,
            public_id,
            username: request.username.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            email: request.email.clone(),
            created_at: now,
        })
    }

    /// Find a user by internal id
    pub async fn find_by_id(&self, user_id: i64) -> CoreResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, public_id, username, first_name, last_name, email, created_at
             FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// Find a user by public id
    pub async fn find_by_public_id(&self, public_id: &str) -> CoreResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, public_id, username, first_name, last_name, email, created_at
             FROM users WHERE public_id = ?",
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// Resolve a batch of public ids. Unknown ids are simply absent from the
    /// result; callers decide whether that is an error.
    pub async fn find_by_public_ids(&self, public_ids: &[String]) -> CoreResult<Vec<User>> {
        if public_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; public_ids.len()].join(", ");
        let sql = format!(
            "SELECT id, public_id, username, first_name, last_name, email, created_at
             FROM users WHERE public_id IN ({placeholders}) ORDER BY id ASC"
        );

        let mut query = sqlx::query(&sql);
        for public_id in public_ids {
            query = query.bind(public_id);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_user).collect()
    }

    /// Case-insensitive substring search across name, email, and handle,
    /// excluding the given user.
    pub async fn search(
        &self,
        query: &str,
        exclude_user_id: i64,
        limit: u32,
    ) -> CoreResult<Vec<User>> {
        let pattern = format!("%{}%", query.to_lowercase());

        let rows = sqlx::query(
            "SELECT id, public_id, username, first_name, last_name, email, created_at
             FROM users
             WHERE id != ?
               AND (LOWER(first_name) LIKE ?
                 OR LOWER(last_name) LIKE ?
                 OR LOWER(email) LIKE ?
                 OR LOWER(username) LIKE ?)
             ORDER BY username ASC
             LIMIT ?",
        )
        .bind(exclude_user_id)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_user).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::bootstrap_schema;
    use sqlx::sqlite::SqliteConnectOptions;
    use tempfile::TempDir;

    async fn create_test_pool() -> (SqlitePool, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test_users.db");

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await.unwrap();
        bootstrap_schema(&pool).await.unwrap();

        (pool, temp_dir)
    }

    fn user_request(username: &str, first: &str, last: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{username}@example.com"),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = UserRepository::new(pool);

        let created = repo.create(&user_request("ada", "Ada", "Lovelace")).await.unwrap();
        assert!(created.id > 0);

        let by_id = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "ada");

        let by_public = repo
            .find_by_public_id(&created.public_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_public.id, created.id);
    }

    #[tokio::test]
    async fn test_find_by_public_ids_skips_unknown() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = UserRepository::new(pool);

        let a = repo.create(&user_request("ada", "Ada", "Lovelace")).await.unwrap();
        let b = repo.create(&user_request("bob", "Bob", "Martin")).await.unwrap();

        let resolved = repo
            .find_by_public_ids(&[
                a.public_id.clone(),
                "does-not-exist".to_string(),
                b.public_id.clone(),
            ])
            .await
            .unwrap();

        assert_eq!(resolved.len(), 2);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_excludes_self() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = UserRepository::new(pool);

        let ada = repo.create(&user_request("ada", "Ada", "Lovelace")).await.unwrap();
        repo.create(&user_request("adam", "Adam", "Smith")).await.unwrap();
        repo.create(&user_request("bob", "Bob", "Martin")).await.unwrap();

        let results = repo.search("AD", ada.id, 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].username, "adam");

        // Email matches too
        let results = repo.search("bob@example", ada.id, 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].username, "bob");
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let (pool, _temp_dir) = create_test_pool().await;
        let repo = UserRepository::new(pool);

        for i in 0..5 {
            repo.create(&user_request(&format!("user{i}"), "Sam", "Doe"))
                .await
                .unwrap();
        }

        let results = repo.search("user", 0, 3).await.unwrap();
        assert_eq!(results.len(), 3);
    }
}
