//! Middleware and extractors for Web API.

pub mod auth;
pub mod cors;

pub use auth::{AuthUser, ReadScope, RequiredScopes, Scoped, WriteScope};
pub use cors::create_cors_layer;
