//! Authentication handlers.

use std::sync::Arc;

use axum::{extract::State, Form, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::auth::{authenticate, register as register_user, RegistrationRequest, TokenType};
use crate::db::{User, UserRepository};
use crate::web::dto::{
    EmptyResponse, LoginForm, MessageResponse, RegisterRequest, TokenResponse, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// Path the refresh cookie is scoped to.
pub const REFRESH_COOKIE_PATH: &str = "/token/refresh";

fn refresh_cookie(state: &AppState, value: String) -> Cookie<'static> {
    let security = &state.config.security;
    let mut cookie = Cookie::build((security.refresh_cookie_name.clone(), value))
        .http_only(true)
        .secure(security.refresh_cookie_secure)
        .same_site(SameSite::None)
        .path(REFRESH_COOKIE_PATH)
        .max_age(time::Duration::seconds(state.tokens.refresh_ttl_secs()))
        .build();
    if !security.refresh_cookie_domain.is_empty() {
        cookie.set_domain(security.refresh_cookie_domain.clone());
    }
    cookie
}

fn issue_session(
    state: &AppState,
    jar: CookieJar,
    user: &User,
) -> Result<(CookieJar, Json<TokenResponse>), ApiError> {
    let pair = state.tokens.issue(user)?;
    let jar = jar.add(refresh_cookie(state, pair.refresh_token));
    Ok((jar, Json(TokenResponse::bearer(pair.access_token))))
}

/// POST /register - Create an account.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let request =
        RegistrationRequest::new(req.username, req.password, req.full_name).with_age(req.age);
    register_user(state.db.pool(), &state.storage, request).await?;

    Ok(Json(MessageResponse::new("User successfully created")))
}

/// POST /login - Exchange form credentials for tokens.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Json<TokenResponse>), ApiError> {
    let user = authenticate(state.db.pool(), &form.username, &form.password)
        .await?
        .ok_or_else(|| ApiError::bad_request("Incorrect username or password"))?;

    tracing::info!(username = %user.username, "User logged in");
    issue_session(&state, jar, &user)
}

/// POST /token/refresh - Rotate the token pair using the refresh cookie.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<TokenResponse>), ApiError> {
    let rejected = || ApiError::unauthorized("Could not validate refresh token");

    let token = jar
        .get(&state.config.security.refresh_cookie_name)
        .map(|c| c.value().to_string())
        .ok_or_else(rejected)?;

    let claims = state
        .tokens
        .validate(&token, TokenType::Refresh)
        .map_err(|e| {
            tracing::debug!(error = %e, "Refresh token rejected");
            rejected()
        })?;

    let user = UserRepository::new(state.db.pool())
        .get_by_username(&claims.sub)
        .await?
        .ok_or_else(rejected)?;

    issue_session(&state, jar, &user)
}

/// POST /logout - Clear the refresh cookie.
///
/// Tokens are stateless, so an issued access token stays valid until it
/// expires.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    jar: CookieJar,
) -> (CookieJar, Json<EmptyResponse>) {
    tracing::info!(username = %auth.user.username, "User logged out");

    // The browser never sends the cookie here, so emit the removal directly
    let mut removal = refresh_cookie(&state, String::new());
    removal.make_removal();
    (jar.add(removal), Json(EmptyResponse::default()))
}
