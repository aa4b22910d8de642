//! Authentication module for filedock.
//!
//! This module provides password hashing, user registration and login,
//! signed access/refresh tokens and scope checks.

mod password;
mod registration;
pub mod scope;
mod token;

pub use password::{
    hash_password, validate_password, verify_password, PasswordError, MAX_PASSWORD_LENGTH,
    MIN_PASSWORD_LENGTH,
};
pub use registration::{
    authenticate, register, RegistrationError, RegistrationRequest, MAX_FULL_NAME_LENGTH,
    MAX_USERNAME_LENGTH,
};
pub use scope::has_scopes;
pub use token::{Claims, TokenError, TokenPair, TokenService, TokenType};
