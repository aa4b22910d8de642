//! User registration and login for filedock.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::auth::{hash_password, verify_password, PasswordError};
use crate::db::{NewUser, User, UserRepository};
use crate::file::FileStorage;
use crate::FiledockError;

/// Maximum username length (characters).
pub const MAX_USERNAME_LENGTH: usize = 63;

/// Maximum full name length (characters).
pub const MAX_FULL_NAME_LENGTH: usize = 128;

/// Registration-specific errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// A field failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Username already exists.
    #[error("user with same username exists")]
    UsernameExists,

    /// Password rejected or hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database or storage failure.
    #[error(transparent)]
    Internal(FiledockError),
}

impl From<FiledockError> for RegistrationError {
    fn from(e: FiledockError) -> Self {
        match e {
            FiledockError::Conflict(_) => RegistrationError::UsernameExists,
            other => RegistrationError::Internal(other),
        }
    }
}

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Desired username (1-63 characters).
    pub username: String,
    /// Password (8-128 characters).
    pub password: String,
    /// Display name (1-128 characters).
    pub full_name: String,
    /// Optional age.
    pub age: Option<i32>,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            full_name: full_name.into(),
            age: None,
        }
    }

    /// Set the age.
    pub fn with_age(mut self, age: Option<i32>) -> Self {
        self.age = age;
        self
    }

    fn validate(&self) -> Result<(), RegistrationError> {
        let username_len = self.username.chars().count();
        if username_len == 0 || username_len > MAX_USERNAME_LENGTH {
            return Err(RegistrationError::Validation(format!(
                "username must be 1-{MAX_USERNAME_LENGTH} characters"
            )));
        }
        let full_name_len = self.full_name.chars().count();
        if full_name_len == 0 || full_name_len > MAX_FULL_NAME_LENGTH {
            return Err(RegistrationError::Validation(format!(
                "full name must be 1-{MAX_FULL_NAME_LENGTH} characters"
            )));
        }
        if matches!(self.age, Some(age) if age < 0) {
            return Err(RegistrationError::Validation(
                "age cannot be negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Register a new user and create their storage root.
///
/// If the storage root cannot be created the user row is removed again,
/// so a failed registration leaves nothing behind.
pub async fn register(
    pool: &SqlitePool,
    storage: &FileStorage,
    request: RegistrationRequest,
) -> Result<User, RegistrationError> {
    request.validate()?;

    let repo = UserRepository::new(pool);
    if repo.get_by_username(&request.username).await?.is_some() {
        return Err(RegistrationError::UsernameExists);
    }

    let password_hash = hash_password(&request.password)?;
    let new_user = NewUser::new(&request.username, password_hash, &request.full_name)
        .with_age(request.age);
    let user = repo.create(&new_user).await?;

    if let Err(e) = storage.create_user_dir(user.id).await {
        error!(user_id = user.id, error = %e, "Failed to create storage root; undoing registration");
        if let Err(undo) = repo.delete(user.id).await {
            error!(user_id = user.id, error = %undo, "Failed to remove user after storage error");
        }
        return Err(RegistrationError::Internal(e));
    }

    info!(username = %user.username, user_id = user.id, "New user registered");
    Ok(user)
}

/// Check a username and password.
///
/// Returns `None` for an unknown user or a wrong password.
pub async fn authenticate(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> crate::Result<Option<User>> {
    let Some(user) = UserRepository::new(pool).get_by_username(username).await? else {
        debug!(username, "Login for unknown user");
        return Ok(None);
    };

    match verify_password(password, &user.password) {
        Ok(()) => Ok(Some(user)),
        Err(e) => {
            debug!(username, error = %e, "Login rejected");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use tempfile::TempDir;

    async fn setup() -> (Database, FileStorage, TempDir) {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path(), 1024);
        (Database::open_in_memory().await.unwrap(), storage, dir)
    }

    #[tokio::test]
    async fn test_register_success() {
        let (db, storage, _dir) = setup().await;

        let request = RegistrationRequest::new("alice", "password123", "Alice").with_age(Some(30));
        let user = register(db.pool(), &storage, request).await.unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.full_name, "Alice");
        assert_eq!(user.age, Some(30));
        assert!(user.password.starts_with("$argon2id$"));
        assert!(storage.user_dir(user.id).is_dir());
    }

    #[tokio::test]
    async fn test_register_duplicate_username() {
        let (db, storage, _dir) = setup().await;

        register(
            db.pool(),
            &storage,
            RegistrationRequest::new("alice", "password123", "Alice"),
        )
        .await
        .unwrap();
        let result = register(
            db.pool(),
            &storage,
            RegistrationRequest::new("alice", "password456", "Other"),
        )
        .await;

        assert!(matches!(result, Err(RegistrationError::UsernameExists)));
        let repo = UserRepository::new(db.pool());
        assert_eq!(repo.count_by_username("alice").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (db, storage, _dir) = setup().await;

        let result = register(
            db.pool(),
            &storage,
            RegistrationRequest::new("", "password123", "Nobody"),
        )
        .await;
        assert!(matches!(result, Err(RegistrationError::Validation(_))));

        let result = register(
            db.pool(),
            &storage,
            RegistrationRequest::new("bob", "password123", ""),
        )
        .await;
        assert!(matches!(result, Err(RegistrationError::Validation(_))));

        let result = register(
            db.pool(),
            &storage,
            RegistrationRequest::new("bob", "short", "Bob"),
        )
        .await;
        assert!(matches!(
            result,
            Err(RegistrationError::Password(PasswordError::TooShort))
        ));
    }

    #[tokio::test]
    async fn test_register_undone_when_storage_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let storage = FileStorage::new(&blocker, 1024);
        let db = Database::open_in_memory().await.unwrap();

        let result = register(
            db.pool(),
            &storage,
            RegistrationRequest::new("alice", "password123", "Alice"),
        )
        .await;

        assert!(matches!(result, Err(RegistrationError::Internal(_))));
        let repo = UserRepository::new(db.pool());
        assert!(repo.get_by_username("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let (db, storage, _dir) = setup().await;
        register(
            db.pool(),
            &storage,
            RegistrationRequest::new("alice", "password123", "Alice"),
        )
        .await
        .unwrap();

        let user = authenticate(db.pool(), "alice", "password123").await.unwrap();
        assert_eq!(user.unwrap().username, "alice");

        assert!(authenticate(db.pool(), "alice", "wrong-password")
            .await
            .unwrap()
            .is_none());
        assert!(authenticate(db.pool(), "nobody", "password123")
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_registration_error_display() {
        assert!(RegistrationError::UsernameExists
            .to_string()
            .contains("same username"));
        assert!(RegistrationError::Validation("bad".into())
            .to_string()
            .contains("validation"));
    }
}
