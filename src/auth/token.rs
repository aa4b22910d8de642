//! Access and refresh tokens for filedock.
//!
//! Tokens are HS256 JWTs. Access tokens carry the subject's scopes; refresh
//! tokens carry only the subject. The `typ` claim keeps the two apart.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;
use crate::db::User;

/// Token kind, carried in the `typ` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username).
    pub sub: String,
    /// Granted scopes; empty on refresh tokens.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    /// Token kind.
    pub typ: TokenType,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
    /// Unique token ID.
    pub jti: String,
}

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Token errors.
#[derive(Error, Debug)]
pub enum TokenError {
    /// Bad signature, expired, malformed or missing subject.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// A valid token of the other kind.
    #[error("expected {expected:?} token")]
    WrongType { expected: TokenType },

    /// Signing failed.
    #[error("failed to sign token: {0}")]
    Encode(String),
}

/// Issues and validates tokens with one symmetric secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    /// Create a token service. Lifetimes are in minutes.
    pub fn new(secret: &str, access_minutes: u64, refresh_minutes: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl_secs: minutes_to_secs(access_minutes),
            refresh_ttl_secs: minutes_to_secs(refresh_minutes),
        }
    }

    /// Create a token service from the security settings.
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(
            &config.secret_key,
            config.access_token_expiry_minutes,
            config.refresh_token_expiry_minutes,
        )
    }

    /// Refresh token lifetime in seconds (also the refresh cookie's max-age).
    pub fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_ttl_secs
    }

    /// Issue an access/refresh pair for a user.
    pub fn issue(&self, user: &User) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.sign(
                &user.username,
                user.scopes.as_slice().to_vec(),
                TokenType::Access,
            )?,
            refresh_token: self.sign(&user.username, Vec::new(), TokenType::Refresh)?,
        })
    }

    fn sign(&self, subject: &str, scopes: Vec<String>, typ: TokenType) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let ttl = match typ {
            TokenType::Access => self.access_ttl_secs,
            TokenType::Refresh => self.refresh_ttl_secs,
        };
        let claims = Claims {
            sub: subject.to_string(),
            scopes,
            typ,
            iat: now,
            exp: now + ttl,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Validate a token and check its kind.
    pub fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| TokenError::Invalid(e.to_string()))?
            .claims;

        if claims.sub.is_empty() {
            return Err(TokenError::Invalid("missing subject".to_string()));
        }
        if claims.typ != expected {
            return Err(TokenError::WrongType { expected });
        }
        Ok(claims)
    }
}

fn minutes_to_secs(minutes: u64) -> i64 {
    i64::try_from(minutes.saturating_mul(60)).unwrap_or(i64::MAX / 2)
}
