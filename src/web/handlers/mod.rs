//! API handlers for filedock.

pub mod auth;
pub mod file;
pub mod folder;

use std::sync::Arc;

use crate::auth::TokenService;
use crate::file::{FileCatalog, FileStorage, FolderDirectory, UserLocks};
use crate::{Config, Database};

pub use auth::{login, logout, refresh, register};
pub use file::{
    browse_files, delete_files, download_owned, download_shared, file_settings, move_file,
    upload_file,
};
pub use folder::{create_folders, delete_folders, list_folders, rename_folder};

/// Application state shared across handlers.
pub struct AppState {
    /// Database handle.
    pub db: Database,
    /// Immutable configuration loaded at startup.
    pub config: Arc<Config>,
    /// Token issuer and validator.
    pub tokens: TokenService,
    /// Disk storage.
    pub storage: FileStorage,
    /// Per-user mutation locks.
    pub locks: UserLocks,
}

impl AppState {
    /// Create the application state.
    pub fn new(db: Database, config: Arc<Config>) -> Self {
        let tokens = TokenService::from_config(&config.security);
        let storage = FileStorage::new(&config.storage.root, config.storage.max_upload_bytes());
        Self {
            db,
            config,
            tokens,
            storage,
            locks: UserLocks::default(),
        }
    }

    /// Folder operations bound to this state.
    pub fn folders(&self) -> FolderDirectory<'_> {
        FolderDirectory::new(self.db.pool(), &self.storage, &self.locks)
    }

    /// File operations bound to this state.
    pub fn catalog(&self) -> FileCatalog<'_> {
        FileCatalog::new(
            self.db.pool(),
            &self.storage,
            &self.locks,
            &self.config.server.public_base_url,
        )
    }
}
