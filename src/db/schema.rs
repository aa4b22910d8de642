//! Database schema and migrations for filedock.
//!
//! Migrations are applied in order when the database is opened; the
//! `schema_version` table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE,
    password    TEXT NOT NULL,                -- Argon2 hash
    full_name   TEXT NOT NULL,
    age         INTEGER,
    scopes      TEXT NOT NULL DEFAULT '["*"]', -- JSON array of scope names
    created_at  TEXT NOT NULL
);

CREATE INDEX idx_users_username ON users(username);
"#,
    // v2: folders, unique per owner
    r#"
CREATE TABLE folders (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL,
    UNIQUE(user_id, name)
);

CREATE INDEX idx_folders_user_id ON folders(user_id);
"#,
    // v3: files, logical name unique per folder
    r#"
CREATE TABLE files (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,              -- logical name, no extension
    full_name     TEXT NOT NULL,              -- stored name on disk
    size          INTEGER NOT NULL,
    content_type  TEXT NOT NULL,
    shared        INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL,
    updated_at    TEXT,
    folder_id     INTEGER NOT NULL REFERENCES folders(id) ON DELETE CASCADE,
    user_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    UNIQUE(user_id, folder_id, name),
    UNIQUE(folder_id, full_name)
);

CREATE INDEX idx_files_user_id ON files(user_id);
CREATE INDEX idx_files_folder_id ON files(folder_id);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
    }

    #[test]
    fn test_first_migration_contains_users_table() {
        let first = MIGRATIONS[0];
        assert!(first.contains("CREATE TABLE users"));
        assert!(first.contains("username    TEXT NOT NULL UNIQUE"));
        assert!(first.contains("scopes"));
    }

    #[test]
    fn test_folder_names_unique_per_user() {
        assert!(MIGRATIONS[1].contains("UNIQUE(user_id, name)"));
        assert!(MIGRATIONS[1].contains("ON DELETE CASCADE"));
    }

    #[test]
    fn test_file_names_unique_per_folder() {
        assert!(MIGRATIONS[2].contains("UNIQUE(user_id, folder_id, name)"));
        assert!(MIGRATIONS[2].contains("REFERENCES folders(id) ON DELETE CASCADE"));
    }
}
