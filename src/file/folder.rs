//! Folder model and repository for filedock.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::Result;

const FOLDER_COLUMNS: &str = "id, name, user_id, created_at";

/// A user-owned folder.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Folder {
    /// Unique folder ID.
    pub id: i64,
    /// Folder name, unique per owner.
    pub name: String,
    /// Owning user.
    pub user_id: i64,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
}

/// Repository for folder rows.
///
/// Reads go through the pool. Writes that must commit together with a
/// directory change take a connection borrowed from an open transaction.
pub struct FolderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FolderRepository<'a> {
    /// Create a new FolderRepository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a folder row inside a transaction.
    pub async fn insert(conn: &mut SqliteConnection, user_id: i64, name: &str) -> Result<Folder> {
        let sql = format!(
            "INSERT INTO folders (name, user_id, created_at) VALUES (?, ?, ?) RETURNING {FOLDER_COLUMNS}"
        );
        let folder = sqlx::query_as::<_, Folder>(&sql)
            .bind(name)
            .bind(user_id)
            .bind(Utc::now())
            .fetch_one(conn)
            .await?;
        Ok(folder)
    }

    /// Rename a folder row inside a transaction.
    pub async fn rename(conn: &mut SqliteConnection, id: i64, new_name: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE folders SET name = ? WHERE id = ?")
            .bind(new_name)
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Get a folder by ID, scoped to its owner.
    pub async fn get_by_id(&self, id: i64, user_id: i64) -> Result<Option<Folder>> {
        let sql = format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ? AND user_id = ?");
        let folder = sqlx::query_as::<_, Folder>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(folder)
    }

    /// Get a folder by its owner and name.
    pub async fn get_by_name(&self, name: &str, user_id: i64) -> Result<Option<Folder>> {
        let sql = format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE name = ? AND user_id = ?");
        let folder = sqlx::query_as::<_, Folder>(&sql)
            .bind(name)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(folder)
    }

    /// List a user's folders in creation order.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<Folder>> {
        let sql = format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE user_id = ? ORDER BY id");
        let folders = sqlx::query_as::<_, Folder>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;
        Ok(folders)
    }

    /// Delete a folder row. Its files go with it (`ON DELETE CASCADE`).
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Count files in a folder.
    pub async fn count_files(&self, folder_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE folder_id = ?")
            .bind(folder_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, NewUser, UserRepository};

    async fn setup() -> (Database, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("alice", "hash", "Alice"))
            .await
            .unwrap();
        (db, user.id)
    }

    async fn insert(db: &Database, user_id: i64, name: &str) -> Result<Folder> {
        let mut conn = db.pool().acquire().await.unwrap();
        FolderRepository::insert(&mut conn, user_id, name).await
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let (db, user_id) = setup().await;
        let folder = insert(&db, user_id, "Docs").await.unwrap();
        assert_eq!(folder.name, "Docs");
        assert_eq!(folder.user_id, user_id);

        let repo = FolderRepository::new(db.pool());
        assert_eq!(repo.get_by_id(folder.id, user_id).await.unwrap(), Some(folder.clone()));
        assert_eq!(
            repo.get_by_name("Docs", user_id).await.unwrap(),
            Some(folder.clone())
        );
        // Scoped to owner
        assert!(repo.get_by_id(folder.id, user_id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_name_is_conflict() {
        let (db, user_id) = setup().await;
        insert(&db, user_id, "Docs").await.unwrap();
        let err = insert(&db, user_id, "Docs").await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_list_rename_delete() {
        let (db, user_id) = setup().await;
        let a = insert(&db, user_id, "A").await.unwrap();
        insert(&db, user_id, "B").await.unwrap();

        let repo = FolderRepository::new(db.pool());
        let names: Vec<String> = repo
            .list_by_user(user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["A", "B"]);

        {
            let mut conn = db.pool().acquire().await.unwrap();
            assert!(FolderRepository::rename(&mut conn, a.id, "C").await.unwrap());
        }
        assert!(repo.get_by_name("A", user_id).await.unwrap().is_none());
        assert!(repo.get_by_name("C", user_id).await.unwrap().is_some());

        assert!(repo.delete(a.id).await.unwrap());
        assert!(!repo.delete(a.id).await.unwrap());
        assert_eq!(repo.list_by_user(user_id).await.unwrap().len(), 1);
        assert_eq!(repo.count_files(a.id).await.unwrap(), 0);
    }
}
