//! File management module for filedock.
//!
//! This module provides:
//! - Folder and file metadata repositories
//! - Disk storage under a per-user tree
//! - The folder directory and file catalog services that keep both in step
//! - Browse ordering

pub mod browse;
mod catalog;
mod directory;
mod folder;
mod lock;
mod metadata;
pub mod name;
mod storage;

pub use browse::{BrowseFilters, SizeOrder};
pub use catalog::{
    Download, FileCatalog, RenameOutcome, SettingsChange, SettingsOutcome, ShareResult,
};
pub use directory::{BulkOutcome, FolderDirectory};
pub use folder::{Folder, FolderRepository};
pub use lock::{UserGuard, UserLocks};
pub use metadata::{FileRecord, FileRepository, FileSummary, NewFile};
pub use storage::{FileStorage, UploadSource};
