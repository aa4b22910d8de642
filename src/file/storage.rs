//! Disk storage for filedock.
//!
//! Files live under a per-user tree:
//! ```text
//! {root}/
//! └── {user_id}/
//!     └── {folder name}/
//!         └── {full name}
//! ```
//! Names are validated by the caller before they reach this module.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::{FiledockError, Result};

/// A source of upload bytes, read chunk by chunk.
pub trait UploadSource: Send {
    /// Chunk type yielded by the source.
    type Chunk: AsRef<[u8]> + Send;

    /// Next chunk, or `None` at end of input.
    fn next_chunk(&mut self) -> impl Future<Output = Result<Option<Self::Chunk>>> + Send;
}

/// Physical storage rooted at the configured directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
    max_upload_bytes: u64,
}

impl FileStorage {
    /// Create a storage handle. Nothing is touched on disk until [`init`](Self::init).
    pub fn new(root: impl Into<PathBuf>, max_upload_bytes: u64) -> Self {
        Self {
            root: root.into(),
            max_upload_bytes,
        }
    }

    /// Create the storage root if it doesn't exist.
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Upload size limit in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Directory holding all of one user's folders.
    pub fn user_dir(&self, user_id: i64) -> PathBuf {
        self.root.join(user_id.to_string())
    }

    /// Directory backing one folder.
    pub fn folder_dir(&self, user_id: i64, folder: &str) -> PathBuf {
        self.user_dir(user_id).join(folder)
    }

    /// Path of a stored file.
    pub fn file_path(&self, user_id: i64, folder: &str, full_name: &str) -> PathBuf {
        self.folder_dir(user_id, folder).join(full_name)
    }

    /// Create a user's storage root.
    pub async fn create_user_dir(&self, user_id: i64) -> Result<()> {
        fs::create_dir_all(self.user_dir(user_id)).await?;
        Ok(())
    }

    /// Create the directory for a folder.
    ///
    /// A directory left behind by an earlier failed removal is adopted.
    /// Returns `true` only if this call created the directory.
    pub async fn create_folder(&self, user_id: i64, folder: &str) -> Result<bool> {
        fs::create_dir_all(self.user_dir(user_id)).await?;

        let dir = self.folder_dir(user_id, folder);
        match fs::create_dir(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!(path = %dir.display(), "Adopting existing folder directory");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Rename a folder's directory. Refuses to replace an existing path.
    pub async fn rename_folder(&self, user_id: i64, old: &str, new: &str) -> Result<()> {
        rename_no_clobber(
            &self.folder_dir(user_id, old),
            &self.folder_dir(user_id, new),
        )
        .await
    }

    /// Remove a folder's directory and everything in it.
    ///
    /// A directory that is already gone is not an error.
    pub async fn remove_folder(&self, user_id: i64, folder: &str) -> Result<()> {
        match fs::remove_dir_all(self.folder_dir(user_id, folder)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Stream an upload into a new file, returning the number of bytes written.
    ///
    /// Fails with `Conflict` if the file already exists and with `TooLarge`
    /// once the size limit is crossed. A partially written file is removed
    /// on any failure.
    pub async fn write<S: UploadSource>(
        &self,
        user_id: i64,
        folder: &str,
        full_name: &str,
        source: &mut S,
    ) -> Result<u64> {
        let path = self.file_path(user_id, folder, full_name);

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(FiledockError::Conflict(format!(
                    "file <{full_name}> already exists on disk"
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let limit = self.max_upload_bytes;
        let result = async {
            let mut written: u64 = 0;
            while let Some(chunk) = source.next_chunk().await? {
                let bytes = chunk.as_ref();
                written += bytes.len() as u64;
                if written > limit {
                    return Err(FiledockError::TooLarge(limit));
                }
                file.write_all(bytes).await?;
            }
            file.flush().await?;
            file.sync_all().await?;
            Ok(written)
        }
        .await;

        drop(file);

        match result {
            Ok(written) => {
                debug!(path = %path.display(), bytes = written, "File written");
                Ok(written)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %cleanup, "Failed to remove partial upload");
                }
                Err(e)
            }
        }
    }

    /// Read a whole stored file.
    pub async fn read(&self, user_id: i64, folder: &str, full_name: &str) -> Result<Vec<u8>> {
        let path = self.file_path(user_id, folder, full_name);
        match fs::read(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(FiledockError::NotFound(format!("file <{full_name}>")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Rename a file inside its folder. Refuses to replace an existing file.
    pub async fn rename_file(
        &self,
        user_id: i64,
        folder: &str,
        old_full_name: &str,
        new_full_name: &str,
    ) -> Result<()> {
        rename_no_clobber(
            &self.file_path(user_id, folder, old_full_name),
            &self.file_path(user_id, folder, new_full_name),
        )
        .await
    }

    /// Move a file between two of the user's folders, keeping its name.
    pub async fn move_file(
        &self,
        user_id: i64,
        from_folder: &str,
        to_folder: &str,
        full_name: &str,
    ) -> Result<()> {
        rename_no_clobber(
            &self.file_path(user_id, from_folder, full_name),
            &self.file_path(user_id, to_folder, full_name),
        )
        .await
    }

    /// Delete a stored file.
    ///
    /// Returns `false` if it didn't exist.
    pub async fn remove_file(&self, user_id: i64, folder: &str, full_name: &str) -> Result<bool> {
        match fs::remove_file(self.file_path(user_id, folder, full_name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Last path component, for error messages that must not reveal the storage root.
fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

async fn rename_no_clobber(from: &Path, to: &Path) -> Result<()> {
    if fs::try_exists(to).await? {
        debug!(path = %to.display(), "Rename target already exists");
        return Err(FiledockError::Conflict(format!(
            "<{}> already exists on disk",
            entry_name(to)
        )));
    }
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %from.display(), "Rename source is missing");
            Err(FiledockError::NotFound(format!(
                "stored entry <{}>",
                entry_name(from)
            )))
        }
        Err(e) => Err(e.into()),
    }
}
