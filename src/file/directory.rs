//! Folder directory service.
//!
//! Keeps folder rows and their directories in step. The database commit
//! decides the outcome; a directory change that cannot be matched by a
//! commit is undone, and a directory that cannot be removed after its row
//! is gone is logged and left behind.

use std::collections::BTreeSet;

use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use super::lock::UserLocks;
use super::name::require_segment;
use super::storage::FileStorage;
use super::{Folder, FolderRepository};
use crate::{FiledockError, Result};

/// Outcome of a bulk operation: both subsets are always reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome<T: Ord> {
    /// Items that were processed.
    pub succeeded: BTreeSet<T>,
    /// Items that were skipped or failed.
    pub failed: BTreeSet<T>,
}

impl<T: Ord> Default for BulkOutcome<T> {
    fn default() -> Self {
        Self {
            succeeded: BTreeSet::new(),
            failed: BTreeSet::new(),
        }
    }
}

/// Folder operations for one request.
pub struct FolderDirectory<'a> {
    pool: &'a SqlitePool,
    storage: &'a FileStorage,
    locks: &'a UserLocks,
}

impl<'a> FolderDirectory<'a> {
    /// Create a new FolderDirectory.
    pub fn new(pool: &'a SqlitePool, storage: &'a FileStorage, locks: &'a UserLocks) -> Self {
        Self {
            pool,
            storage,
            locks,
        }
    }

    fn repo(&self) -> FolderRepository<'a> {
        FolderRepository::new(self.pool)
    }

    /// List a user's folders.
    pub async fn list(&self, user_id: i64) -> Result<Vec<Folder>> {
        self.repo().list_by_user(user_id).await
    }

    /// Create a folder and its directory.
    pub async fn create(&self, user_id: i64, name: &str) -> Result<Folder> {
        require_segment("folder name", name)?;
        let _guard = self.locks.acquire(user_id).await;

        if self.repo().get_by_name(name, user_id).await?.is_some() {
            return Err(duplicate(name));
        }
        self.create_locked(user_id, name).await
    }

    async fn create_locked(&self, user_id: i64, name: &str) -> Result<Folder> {
        let mut tx = self.pool.begin().await?;
        let folder = FolderRepository::insert(&mut *tx, user_id, name).await?;

        // Dropping the transaction rolls the insert back
        let created = self.storage.create_folder(user_id, name).await?;

        if let Err(e) = tx.commit().await {
            // An adopted directory was never ours to remove
            if created {
                if let Err(cleanup) = self.storage.remove_folder(user_id, name).await {
                    warn!(user_id, folder = name, error = %cleanup, "Failed to remove directory after aborted create");
                }
            }
            return Err(e.into());
        }

        info!(user_id, folder_id = folder.id, folder = name, "Folder created");
        Ok(folder)
    }

    /// Rename a folder and its directory.
    pub async fn rename(&self, user_id: i64, old_name: &str, new_name: &str) -> Result<()> {
        require_segment("folder name", new_name)?;
        let _guard = self.locks.acquire(user_id).await;

        let folder = self
            .repo()
            .get_by_name(old_name, user_id)
            .await?
            .ok_or_else(|| missing(old_name))?;
        if self.repo().get_by_name(new_name, user_id).await?.is_some() {
            return Err(duplicate(new_name));
        }

        let mut tx = self.pool.begin().await?;
        FolderRepository::rename(&mut *tx, folder.id, new_name).await?;
        self.storage
            .rename_folder(user_id, old_name, new_name)
            .await?;

        if let Err(e) = tx.commit().await {
            if let Err(undo) = self
                .storage
                .rename_folder(user_id, new_name, old_name)
                .await
            {
                error!(user_id, from = new_name, to = old_name, error = %undo, "Failed to restore folder directory");
            }
            return Err(e.into());
        }

        info!(user_id, folder_id = folder.id, from = old_name, to = new_name, "Folder renamed");
        Ok(())
    }

    /// Delete a folder, its files and its directory.
    pub async fn delete(&self, user_id: i64, name: &str) -> Result<()> {
        let _guard = self.locks.acquire(user_id).await;

        let folder = self
            .repo()
            .get_by_name(name, user_id)
            .await?
            .ok_or_else(|| missing(name))?;
        self.delete_locked(&folder).await
    }

    async fn delete_locked(&self, folder: &Folder) -> Result<()> {
        self.repo().delete(folder.id).await?;

        if let Err(e) = self.storage.remove_folder(folder.user_id, &folder.name).await {
            warn!(
                user_id = folder.user_id,
                folder = %folder.name,
                error = %e,
                "Folder row deleted but directory removal failed"
            );
        }

        info!(user_id = folder.user_id, folder_id = folder.id, folder = %folder.name, "Folder deleted");
        Ok(())
    }

    /// Create several folders. Existing and invalid names are reported as failed.
    pub async fn create_many(&self, user_id: i64, names: Vec<String>) -> Result<BulkOutcome<String>> {
        let _guard = self.locks.acquire(user_id).await;
        let mut outcome = BulkOutcome::default();

        let mut to_create = BTreeSet::new();
        for name in names {
            if require_segment("folder name", &name).is_err()
                || self.repo().get_by_name(&name, user_id).await?.is_some()
            {
                outcome.failed.insert(name);
            } else {
                to_create.insert(name);
            }
        }

        for name in to_create {
            match self.create_locked(user_id, &name).await {
                Ok(_) => {
                    outcome.succeeded.insert(name);
                }
                Err(e) => {
                    error!(user_id, folder = %name, error = %e, "Bulk folder create failed");
                    outcome.failed.insert(name);
                }
            }
        }

        debug!(
            user_id,
            created = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Bulk folder create finished"
        );
        Ok(outcome)
    }

    /// Delete several folders. Missing names are reported as failed.
    pub async fn delete_many(&self, user_id: i64, names: Vec<String>) -> Result<BulkOutcome<String>> {
        let _guard = self.locks.acquire(user_id).await;
        let mut outcome = BulkOutcome::default();

        let mut to_delete = Vec::new();
        let mut seen = BTreeSet::new();
        for name in names {
            if !seen.insert(name.clone()) {
                continue;
            }
            match self.repo().get_by_name(&name, user_id).await? {
                Some(folder) => to_delete.push(folder),
                None => {
                    outcome.failed.insert(name);
                }
            }
        }

        for folder in to_delete {
            match self.delete_locked(&folder).await {
                Ok(()) => {
                    outcome.succeeded.insert(folder.name);
                }
                Err(e) => {
                    error!(user_id, folder = %folder.name, error = %e, "Bulk folder delete failed");
                    outcome.failed.insert(folder.name);
                }
            }
        }

        debug!(
            user_id,
            deleted = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Bulk folder delete finished"
        );
        Ok(outcome)
    }
}

fn duplicate(name: &str) -> FiledockError {
    FiledockError::Conflict(format!("folder with this name <{name}> already exists"))
}

fn missing(name: &str) -> FiledockError {
    FiledockError::NotFound(format!("folder <{name}>"))
}
