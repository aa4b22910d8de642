//! User model for filedock.

use chrono::{DateTime, Utc};

/// Scope granting every permission.
pub const WILDCARD_SCOPE: &str = "*";

/// Scope marking an administrator; treated like the wildcard.
pub const ADMIN_SCOPE: &str = "admin";

/// Set of permission scopes granted to a user.
///
/// Stored in the database as a JSON array of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scopes(Vec<String>);

impl Scopes {
    /// Create a scope set from scope names.
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(scopes.into_iter().map(Into::into).collect())
    }

    /// The default scope set for new users: the wildcard.
    pub fn wildcard() -> Self {
        Self(vec![WILDCARD_SCOPE.to_string()])
    }

    /// Scope names as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Consume into the underlying list.
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    /// JSON representation used for storage.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }
}

impl Default for Scopes {
    fn default() -> Self {
        Self::wildcard()
    }
}

impl TryFrom<String> for Scopes {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        serde_json::from_str::<Vec<String>>(&value)
            .map(Scopes)
            .map_err(|e| format!("invalid scopes column: {e}"))
    }
}

/// A registered user.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: i64,
    /// Login username (unique).
    pub username: String,
    /// Password hash (Argon2).
    pub password: String,
    /// Display name.
    pub full_name: String,
    /// Age (optional).
    pub age: Option<i32>,
    /// Granted permission scopes.
    #[sqlx(try_from = "String")]
    pub scopes: Scopes,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login username.
    pub username: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
    /// Display name.
    pub full_name: String,
    /// Age (optional).
    pub age: Option<i32>,
    /// Granted scopes (defaults to the wildcard).
    pub scopes: Scopes,
}

impl NewUser {
    /// Create a new user with minimal required fields.
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
            scopes: Scopes::default(),
        }
    }

    /// Set the age.
    pub fn with_age(mut self, age: Option<i32>) -> Self {
        self.age = age;
        self
    }

    /// Set the scopes.
    pub fn with_scopes(mut self, scopes: Scopes) -> Self {
        self.scopes = scopes;
        self
    }
}
