//! # User Repository
//!
//! Staff accounts. Credentials live with the external authentication layer;
//! these rows give sessions, sales and returns an actor to reference.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use ferre_core::validation::validate_required;
use ferre_core::User;

/// Repository for user rows.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates a user. Usernames are unique.
    pub async fn create(&self, username: &str, is_admin: bool) -> DbResult<User> {
        let username = validate_required("username", username, 150)?;

        let user = User {
            id: generate_id(),
            username,
            is_admin,
            created_at: Utc::now(),
        };

        debug!(id = %user.id, username = %user.username, is_admin, "Creating user");

        sqlx::query("INSERT INTO users (id, username, is_admin, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&user.id)
            .bind(&user.username)
            .bind(user.is_admin)
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("username", &user.username),
                other => other,
            })?;

        Ok(user)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, is_admin, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, is_admin, created_at FROM users WHERE username = ?1",
        )
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Fetches a user that must exist.
    pub async fn require(&self, id: &str) -> DbResult<User> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, is_admin, created_at FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::test_db;

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = test_db().await;
        let user = db.users().create("maria", false).await.unwrap();

        let by_id = db.users().get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "maria");
        assert!(!by_id.is_admin);

        let by_name = db.users().get_by_username("maria").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let db = test_db().await;
        db.users().create("maria", false).await.unwrap();

        let err = db.users().create("maria", true).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_require_missing_user() {
        let db = test_db().await;
        let err = db.users().require("nobody").await.unwrap_err();
        assert!(matches!(err, crate::DbError::NotFound { .. }));
    }
}
