//! File catalog service.
//!
//! Pairs each metadata change with its disk change:
//!
//! - upload writes the file first and inserts the row after; a failed
//!   insert removes the file
//! - rename and move update the row in a transaction, touch the disk, then
//!   commit; a failed commit puts the file back
//! - delete commits the row removal, then removes the file best-effort
//!
//! Every mutation runs under the owner's lock.

use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use super::browse::BrowseFilters;
use super::directory::BulkOutcome;
use super::lock::UserLocks;
use super::name::{extension_of, join_name, require_segment, SplitName};
use super::storage::{FileStorage, UploadSource};
use super::{FileRecord, FileRepository, FileSummary, Folder, FolderRepository, NewFile};
use crate::{FiledockError, Result};

/// Share state after a share change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareResult {
    /// Shared, downloadable at `link` without a token.
    On { link: String },
    /// Not shared.
    Off,
}

/// Outcome of the rename part of a settings change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    Renamed,
    Failed(String),
}

/// Requested settings change for one file.
#[derive(Debug, Clone, Default)]
pub struct SettingsChange {
    pub share: Option<bool>,
    pub rename: Option<String>,
}

/// Per-part outcome of a settings change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsOutcome {
    pub share: Option<ShareResult>,
    pub rename: Option<RenameOutcome>,
}

/// A file's metadata and content.
#[derive(Debug)]
pub struct Download {
    pub record: FileRecord,
    pub content: Vec<u8>,
}

/// File operations for one request.
pub struct FileCatalog<'a> {
    pool: &'a SqlitePool,
    storage: &'a FileStorage,
    locks: &'a UserLocks,
    public_base_url: &'a str,
}

impl<'a> FileCatalog<'a> {
    /// Create a new FileCatalog.
    ///
    /// `public_base_url` prefixes the links handed out for shared files.
    pub fn new(
        pool: &'a SqlitePool,
        storage: &'a FileStorage,
        locks: &'a UserLocks,
        public_base_url: &'a str,
    ) -> Self {
        Self {
            pool,
            storage,
            locks,
            public_base_url,
        }
    }

    fn files(&self) -> FileRepository<'a> {
        FileRepository::new(self.pool)
    }

    fn folders(&self) -> FolderRepository<'a> {
        FolderRepository::new(self.pool)
    }

    async fn owned(&self, file_id: i64, user_id: i64) -> Result<FileRecord> {
        self.files()
            .get_owned(file_id, user_id)
            .await?
            .ok_or_else(|| FiledockError::NotFound(format!("file <{file_id}>")))
    }

    async fn folder(&self, folder_id: i64, user_id: i64) -> Result<Folder> {
        self.folders()
            .get_by_id(folder_id, user_id)
            .await?
            .ok_or_else(|| FiledockError::NotFound(format!("folder <{folder_id}>")))
    }

    /// Link under which a shared file is served.
    pub fn share_link(&self, file_id: i64) -> String {
        format!("{}/file/{}", self.public_base_url.trim_end_matches('/'), file_id)
    }

    /// Store an upload in a folder.
    ///
    /// The logical name is `filename` without its last extension and must be
    /// unique in the folder. A missing content type is guessed from the name.
    pub async fn upload<S: UploadSource>(
        &self,
        user_id: i64,
        folder_id: i64,
        filename: &str,
        content_type: Option<&str>,
        source: &mut S,
    ) -> Result<FileRecord> {
        require_segment("file name", filename)?;
        let split = SplitName::parse(filename);
        let _guard = self.locks.acquire(user_id).await;

        let folder = self.folder(folder_id, user_id).await?;
        if self
            .files()
            .find_by_name(user_id, folder.id, split.stem)
            .await?
            .is_some()
        {
            return Err(duplicate(split.stem));
        }

        let size = self
            .storage
            .write(user_id, &folder.name, filename, source)
            .await?;

        let content_type = content_type
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                mime_guess::from_path(filename)
                    .first_or_octet_stream()
                    .to_string()
            });
        let new_file = NewFile::new(split.stem, filename, folder.id, user_id)
            .with_size(size as i64)
            .with_content_type(content_type);

        match self.files().create(&new_file).await {
            Ok(record) => {
                info!(
                    user_id,
                    file_id = record.id,
                    folder_id = folder.id,
                    size = record.size,
                    "File uploaded"
                );
                Ok(record)
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.remove_file(user_id, &folder.name, filename).await {
                    warn!(user_id, file = filename, error = %cleanup, "Failed to remove orphaned upload");
                }
                Err(e)
            }
        }
    }

    /// Rename a file, keeping its extension.
    pub async fn rename(&self, user_id: i64, file_id: i64, new_name: &str) -> Result<()> {
        require_segment("file name", new_name)?;
        let _guard = self.locks.acquire(user_id).await;

        let file = self.owned(file_id, user_id).await?;
        self.rename_locked(&file, new_name).await
    }

    async fn rename_locked(&self, file: &FileRecord, new_name: &str) -> Result<()> {
        if self
            .files()
            .find_by_name(file.user_id, file.folder_id, new_name)
            .await?
            .is_some()
        {
            return Err(duplicate(new_name));
        }

        let new_full_name = join_name(new_name, extension_of(&file.name, &file.full_name));
        require_segment("file name", &new_full_name)?;
        let folder = self.folder(file.folder_id, file.user_id).await?;

        let mut tx = self.pool.begin().await?;
        FileRepository::rename(&mut *tx, file.id, new_name, &new_full_name).await?;
        self.storage
            .rename_file(file.user_id, &folder.name, &file.full_name, &new_full_name)
            .await?;

        if let Err(e) = tx.commit().await {
            if let Err(undo) = self
                .storage
                .rename_file(file.user_id, &folder.name, &new_full_name, &file.full_name)
                .await
            {
                error!(file_id = file.id, error = %undo, "Failed to restore file name on disk");
            }
            return Err(e.into());
        }

        info!(user_id = file.user_id, file_id = file.id, from = %file.name, to = new_name, "File renamed");
        Ok(())
    }

    /// Turn public sharing on or off.
    pub async fn set_share(&self, user_id: i64, file_id: i64, enabled: bool) -> Result<ShareResult> {
        let _guard = self.locks.acquire(user_id).await;
        let file = self.owned(file_id, user_id).await?;
        self.set_share_locked(&file, enabled).await
    }

    async fn set_share_locked(&self, file: &FileRecord, enabled: bool) -> Result<ShareResult> {
        self.files().set_shared(file.id, enabled).await?;
        info!(user_id = file.user_id, file_id = file.id, shared = enabled, "File share changed");

        Ok(if enabled {
            ShareResult::On {
                link: self.share_link(file.id),
            }
        } else {
            ShareResult::Off
        })
    }

    /// Apply a share change and/or a rename.
    ///
    /// Share is applied first. Each part reports its own outcome; a failed
    /// rename does not undo the share change.
    pub async fn apply_settings(
        &self,
        user_id: i64,
        file_id: i64,
        change: SettingsChange,
    ) -> Result<SettingsOutcome> {
        if change.share.is_none() && change.rename.is_none() {
            return Err(FiledockError::Validation(
                "no setting selected: pass share and/or rename".to_string(),
            ));
        }

        let _guard = self.locks.acquire(user_id).await;
        let file = self.owned(file_id, user_id).await?;

        let share = match change.share {
            Some(enabled) => Some(self.set_share_locked(&file, enabled).await?),
            None => None,
        };

        let rename = match change.rename {
            Some(new_name) => {
                let result = match require_segment("file name", &new_name) {
                    Ok(()) => self.rename_locked(&file, &new_name).await,
                    Err(e) => Err(e),
                };
                Some(match result {
                    Ok(()) => RenameOutcome::Renamed,
                    Err(
                        e @ (FiledockError::Conflict(_)
                        | FiledockError::Validation(_)
                        | FiledockError::NotFound(_)),
                    ) => RenameOutcome::Failed(e.to_string()),
                    Err(e) => {
                        error!(user_id, file_id, error = %e, "File rename failed");
                        RenameOutcome::Failed("the file could not be renamed".to_string())
                    }
                })
            }
            None => None,
        };

        Ok(SettingsOutcome { share, rename })
    }

    /// Move a file to another of the owner's folders.
    pub async fn move_to(&self, user_id: i64, file_id: i64, dest_folder_id: i64) -> Result<()> {
        let _guard = self.locks.acquire(user_id).await;

        let file = self.owned(file_id, user_id).await?;
        let dest = self.folder(dest_folder_id, user_id).await?;
        if file.folder_id == dest.id {
            return Err(FiledockError::Conflict(
                "file is already in this folder".to_string(),
            ));
        }
        if self
            .files()
            .find_by_name(user_id, dest.id, &file.name)
            .await?
            .is_some()
        {
            return Err(duplicate(&file.name));
        }
        let source = self.folder(file.folder_id, user_id).await?;

        let mut tx = self.pool.begin().await?;
        FileRepository::set_folder(&mut *tx, file.id, dest.id).await?;
        self.storage
            .move_file(user_id, &source.name, &dest.name, &file.full_name)
            .await?;

        if let Err(e) = tx.commit().await {
            if let Err(undo) = self
                .storage
                .move_file(user_id, &dest.name, &source.name, &file.full_name)
                .await
            {
                error!(file_id = file.id, error = %undo, "Failed to move file back after aborted move");
            }
            return Err(e.into());
        }

        info!(user_id, file_id = file.id, from = source.id, to = dest.id, "File moved");
        Ok(())
    }

    /// Delete a file.
    pub async fn delete(&self, user_id: i64, file_id: i64) -> Result<()> {
        let _guard = self.locks.acquire(user_id).await;
        let file = self.owned(file_id, user_id).await?;
        self.delete_locked(&file).await
    }

    async fn delete_locked(&self, file: &FileRecord) -> Result<()> {
        let folder = self.folder(file.folder_id, file.user_id).await?;
        self.files().delete(file.id).await?;

        match self
            .storage
            .remove_file(file.user_id, &folder.name, &file.full_name)
            .await
        {
            Ok(true) => {}
            Ok(false) => warn!(file_id = file.id, "File row deleted but file was already gone"),
            Err(e) => warn!(file_id = file.id, error = %e, "File row deleted but file removal failed"),
        }

        info!(user_id = file.user_id, file_id = file.id, "File deleted");
        Ok(())
    }

    /// Delete several files. IDs the user doesn't own are reported as failed.
    pub async fn delete_many(&self, user_id: i64, file_ids: Vec<i64>) -> Result<BulkOutcome<i64>> {
        let _guard = self.locks.acquire(user_id).await;
        let mut outcome = BulkOutcome::default();

        let mut to_delete = Vec::new();
        for id in file_ids {
            if outcome.failed.contains(&id) || to_delete.iter().any(|f: &FileRecord| f.id == id) {
                continue;
            }
            match self.files().get_owned(id, user_id).await? {
                Some(file) => to_delete.push(file),
                None => {
                    outcome.failed.insert(id);
                }
            }
        }

        for file in to_delete {
            match self.delete_locked(&file).await {
                Ok(()) => {
                    outcome.succeeded.insert(file.id);
                }
                Err(e) => {
                    error!(user_id, file_id = file.id, error = %e, "Bulk file delete failed");
                    outcome.failed.insert(file.id);
                }
            }
        }

        debug!(
            user_id,
            deleted = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Bulk file delete finished"
        );
        Ok(outcome)
    }

    /// Metadata of a shared file, regardless of owner.
    pub async fn fetch_shared(&self, file_id: i64) -> Result<FileRecord> {
        self.files()
            .get_shared(file_id)
            .await?
            .ok_or_else(|| FiledockError::NotFound(format!("file <{file_id}>")))
    }

    /// Metadata of one of the user's files.
    pub async fn fetch_owned(&self, file_id: i64, user_id: i64) -> Result<FileRecord> {
        self.owned(file_id, user_id).await
    }

    /// Read a shared file for public download.
    pub async fn download_shared(&self, file_id: i64) -> Result<Download> {
        let record = self.fetch_shared(file_id).await?;
        self.read(record).await
    }

    /// Read one of the user's files.
    pub async fn download_owned(&self, file_id: i64, user_id: i64) -> Result<Download> {
        let record = self.fetch_owned(file_id, user_id).await?;
        self.read(record).await
    }

    async fn read(&self, record: FileRecord) -> Result<Download> {
        let folder = self.folder(record.folder_id, record.user_id).await?;
        let content = self
            .storage
            .read(record.user_id, &folder.name, &record.full_name)
            .await?;
        Ok(Download { record, content })
    }

    /// List the user's files with their folders, optionally sorted.
    ///
    /// The name pattern is accepted but does not narrow the listing.
    pub async fn browse(
        &self,
        user_id: i64,
        name_pattern: Option<&str>,
        filters: Option<&BrowseFilters>,
    ) -> Result<Vec<FileSummary>> {
        if let Some(pattern) = name_pattern.filter(|p| !p.is_empty()) {
            debug!(user_id, pattern, "Browse name pattern not applied to listing");
        }

        let mut files = self.files().list_with_folders(user_id).await?;
        if let Some(filters) = filters {
            filters.apply(&mut files);
        }
        Ok(files)
    }
}

fn duplicate(name: &str) -> FiledockError {
    FiledockError::Conflict(format!("file with this name <{name}> already exists"))
}
