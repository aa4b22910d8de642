//! Bearer token authentication and scope checks.

use std::marker::PhantomData;
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::auth::{has_scopes, scope, Claims, TokenType};
use crate::db::{User, UserRepository};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Extractor for authenticated users.
///
/// Accepts only access tokens whose subject still exists. Carries the
/// stored user and the token's claims.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub claims: Claims,
}

impl AuthUser {
    /// Whether the token grants every scope in `required`.
    pub fn has_scopes(&self, required: &[&str]) -> bool {
        has_scopes(&self.claims.scopes, required)
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

async fn authenticate(parts: &Parts, state: &AppState) -> Result<AuthUser, ApiError> {
    let token =
        bearer_token(parts).ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

    let claims = state.tokens.validate(token, TokenType::Access)?;

    let user = UserRepository::new(state.db.pool())
        .get_by_username(&claims.sub)
        .await?
        .ok_or_else(|| {
            tracing::debug!(username = %claims.sub, "Token subject no longer exists");
            ApiError::unauthorized("Could not validate credentials")
        })?;

    Ok(AuthUser { user, claims })
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move { authenticate(parts, state).await })
    }
}

/// A set of scopes an endpoint requires.
pub trait RequiredScopes: Send + Sync + 'static {
    const SCOPES: &'static [&'static str];
}

/// Read-only endpoints.
#[derive(Debug, Clone, Copy)]
pub struct ReadScope;

impl RequiredScopes for ReadScope {
    const SCOPES: &'static [&'static str] = &[scope::READ];
}

/// Mutating endpoints.
#[derive(Debug, Clone, Copy)]
pub struct WriteScope;

impl RequiredScopes for WriteScope {
    const SCOPES: &'static [&'static str] = &[scope::WRITE];
}

/// Extractor for an authenticated user holding the scopes `R` requires.
///
/// A missing or invalid token is rejected with 401, missing scopes with 403.
#[derive(Debug, Clone)]
pub struct Scoped<R> {
    pub user: User,
    pub claims: Claims,
    _scopes: PhantomData<R>,
}

impl<R: RequiredScopes> FromRequestParts<Arc<AppState>> for Scoped<R> {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let auth = authenticate(parts, state).await?;
            if !auth.has_scopes(R::SCOPES) {
                tracing::debug!(
                    username = %auth.user.username,
                    required = ?R::SCOPES,
                    "Missing scope"
                );
                return Err(ApiError::forbidden("Not enough permissions"));
            }
            Ok(Scoped {
                user: auth.user,
                claims: auth.claims,
                _scopes: PhantomData,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/folder");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts_with(Some("bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts_with(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer"))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }

    #[test]
    fn test_required_scopes() {
        assert_eq!(ReadScope::SCOPES, &["read"]);
        assert_eq!(WriteScope::SCOPES, &["write"]);
    }
}
