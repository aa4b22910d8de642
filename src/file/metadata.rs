//! File metadata model and repository for filedock.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::Result;

const FILE_COLUMNS: &str =
    "id, name, full_name, size, content_type, shared, created_at, updated_at, folder_id, user_id";

/// Metadata for one stored file.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FileRecord {
    /// Unique file ID.
    pub id: i64,
    /// Logical name (no extension), unique per folder.
    pub name: String,
    /// Name on disk, including the extension.
    pub full_name: String,
    /// Size in bytes.
    pub size: i64,
    /// MIME type recorded at upload.
    pub content_type: String,
    /// Whether the file can be downloaded without a token.
    pub shared: bool,
    /// Upload time.
    pub created_at: DateTime<Utc>,
    /// Time of the last metadata change, if any.
    pub updated_at: Option<DateTime<Utc>>,
    /// Containing folder.
    pub folder_id: i64,
    /// Owning user.
    pub user_id: i64,
}

/// A file joined with its folder, as listed by browse.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct FileSummary {
    pub id: i64,
    pub name: String,
    pub content_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub folder_id: i64,
    pub folder_name: String,
}

/// Data for a new file row.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Logical name.
    pub name: String,
    /// Name on disk.
    pub full_name: String,
    /// Size in bytes.
    pub size: i64,
    /// MIME type.
    pub content_type: String,
    /// Containing folder.
    pub folder_id: i64,
    /// Owning user.
    pub user_id: i64,
}

impl NewFile {
    /// Create a new NewFile.
    pub fn new(
        name: impl Into<String>,
        full_name: impl Into<String>,
        folder_id: i64,
        user_id: i64,
    ) -> Self {
        Self {
            name: name.into(),
            full_name: full_name.into(),
            size: 0,
            content_type: "application/octet-stream".to_string(),
            folder_id,
            user_id,
        }
    }

    /// Set the size.
    pub fn with_size(mut self, size: i64) -> Self {
        self.size = size;
        self
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// Repository for file metadata.
///
/// Like [`FolderRepository`](super::FolderRepository), writes that pair
/// with a disk change take a transaction's connection.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a file row.
    pub async fn create(&self, file: &NewFile) -> Result<FileRecord> {
        let sql = format!(
            "INSERT INTO files (name, full_name, size, content_type, created_at, folder_id, user_id)
             VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING {FILE_COLUMNS}"
        );
        let record = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(&file.name)
            .bind(&file.full_name)
            .bind(file.size)
            .bind(&file.content_type)
            .bind(Utc::now())
            .bind(file.folder_id)
            .bind(file.user_id)
            .fetch_one(self.pool)
            .await?;
        Ok(record)
    }

    /// Get a file by ID, scoped to its owner.
    pub async fn get_owned(&self, id: i64, user_id: i64) -> Result<Option<FileRecord>> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ? AND user_id = ?");
        let record = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(record)
    }

    /// Get a file by ID only if it is shared. No ownership check.
    pub async fn get_shared(&self, id: i64) -> Result<Option<FileRecord>> {
        let sql = format!("SELECT {FILE_COLUMNS} FROM files WHERE id = ? AND shared = 1");
        let record = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(record)
    }

    /// Find a file in a folder by logical name.
    pub async fn find_by_name(
        &self,
        user_id: i64,
        folder_id: i64,
        name: &str,
    ) -> Result<Option<FileRecord>> {
        let sql = format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE user_id = ? AND folder_id = ? AND name = ?"
        );
        let record = sqlx::query_as::<_, FileRecord>(&sql)
            .bind(user_id)
            .bind(folder_id)
            .bind(name)
            .fetch_optional(self.pool)
            .await?;
        Ok(record)
    }

    /// Set the share flag.
    pub async fn set_shared(&self, id: i64, shared: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE files SET shared = ?, updated_at = ? WHERE id = ?")
            .bind(shared)
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Change a file's names inside a transaction.
    pub async fn rename(
        conn: &mut SqliteConnection,
        id: i64,
        name: &str,
        full_name: &str,
    ) -> Result<bool> {
        let result =
            sqlx::query("UPDATE files SET name = ?, full_name = ?, updated_at = ? WHERE id = ?")
                .bind(name)
                .bind(full_name)
                .bind(Utc::now())
                .bind(id)
                .execute(conn)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Point a file at another folder inside a transaction.
    pub async fn set_folder(conn: &mut SqliteConnection, id: i64, folder_id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE files SET folder_id = ?, updated_at = ? WHERE id = ?")
            .bind(folder_id)
            .bind(Utc::now())
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a file row.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All of a user's files joined with their folder, in ID order.
    pub async fn list_with_folders(&self, user_id: i64) -> Result<Vec<FileSummary>> {
        let summaries = sqlx::query_as::<_, FileSummary>(
            "SELECT f.id, f.name, f.content_type, f.size, f.created_at, f.updated_at,
                    f.folder_id, d.name AS folder_name
             FROM files f
             JOIN folders d ON d.id = f.folder_id
             WHERE f.user_id = ?
             ORDER BY f.id",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(summaries)
    }
}
