//! Web API module for filedock.
//!
//! REST endpoints for accounts, folders and files, plus the public
//! download route for shared files.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::{create_health_router, create_router};
pub use server::WebServer;
