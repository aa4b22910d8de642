//! filedock - multi-user file storage backend
//!
//! Per-user folders and files on disk with metadata in SQLite, JWT access
//! and refresh tokens, and public download links for shared files.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use auth::{
    authenticate, hash_password, register, validate_password, verify_password, Claims,
    PasswordError, RegistrationError, RegistrationRequest, TokenError, TokenPair, TokenService,
    TokenType,
};
pub use config::Config;
pub use db::{Database, NewUser, Scopes, User, UserRepository};
pub use error::{FiledockError, Result};
pub use file::{FileCatalog, FileStorage, FolderDirectory, UserLocks};
pub use web::{create_router, AppState, WebServer};
