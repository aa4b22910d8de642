//! User repository for filedock.
//!
//! The credential store: persists identities and password hashes.

use chrono::Utc;

use super::user::{NewUser, Scopes, User};
use super::DbPool;
use crate::{FiledockError, Result};

const USER_COLUMNS: &str = "id, username, password, full_name, age, scopes, created_at";

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user in the database.
    ///
    /// A duplicate username fails with `FiledockError::Conflict`.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (username, password, full_name, age, scopes, created_at)
             VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(&new_user.username)
        .bind(&new_user.password)
        .bind(&new_user.full_name)
        .bind(new_user.age)
        .bind(new_user.scopes.to_json())
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| FiledockError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Get a user by username (exact match).
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(self.pool)
            .await?;
        Ok(user)
    }

    /// Replace a user's scopes.
    ///
    /// Not reachable through the HTTP API. Returns false if the user doesn't exist.
    pub async fn set_scopes(&self, id: i64, scopes: &Scopes) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET scopes = ? WHERE id = ?")
            .bind(scopes.to_json())
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a user. Their folders and files go with them.
    ///
    /// Not reachable through the HTTP API; used to undo a registration
    /// whose storage root could not be created.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count users with the given username.
    pub async fn count_by_username(&self, username: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
