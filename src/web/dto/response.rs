//! Response DTOs for Web API.

use std::collections::BTreeSet;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::file::{
    BulkOutcome, FileSummary, Folder, RenameOutcome, SettingsOutcome, ShareResult,
};

/// Plain message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Empty JSON object.
#[derive(Debug, Default, Serialize)]
pub struct EmptyResponse {}

/// Liveness probe response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

// ============================================================================
// Auth DTOs
// ============================================================================

/// Login and refresh response. The refresh token travels in a cookie.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Access token (JWT).
    pub access_token: String,
    /// Always `bearer`.
    pub token_type: &'static str,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer",
        }
    }
}

// ============================================================================
// Folder DTOs
// ============================================================================

/// One folder in a listing.
#[derive(Debug, Serialize)]
pub struct FolderEntry {
    pub folder_id: i64,
    pub folder_name: String,
}

impl From<Folder> for FolderEntry {
    fn from(folder: Folder) -> Self {
        Self {
            folder_id: folder.id,
            folder_name: folder.name,
        }
    }
}

/// Folder listing.
#[derive(Debug, Serialize)]
pub struct FolderListResponse {
    pub folders: Vec<FolderEntry>,
}

/// Bulk create result. Both fields are `"; "`-joined lists.
#[derive(Debug, Serialize)]
pub struct BulkCreatedResponse {
    pub created: String,
    pub failed: String,
}

impl<T: Ord + Display> From<BulkOutcome<T>> for BulkCreatedResponse {
    fn from(outcome: BulkOutcome<T>) -> Self {
        Self {
            created: join_items(&outcome.succeeded),
            failed: join_items(&outcome.failed),
        }
    }
}

/// Bulk delete result. Both fields are `"; "`-joined lists.
#[derive(Debug, Serialize)]
pub struct BulkDeletedResponse {
    pub deleted: String,
    pub failed: String,
}

impl<T: Ord + Display> From<BulkOutcome<T>> for BulkDeletedResponse {
    fn from(outcome: BulkOutcome<T>) -> Self {
        Self {
            deleted: join_items(&outcome.succeeded),
            failed: join_items(&outcome.failed),
        }
    }
}

fn join_items<T: Display>(items: &BTreeSet<T>) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// File DTOs
// ============================================================================

/// One part of a settings result.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SettingsEntry {
    Share {
        share: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        link: Option<String>,
    },
    Rename {
        rename: String,
    },
}

/// File settings result, share part first.
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub result: Vec<SettingsEntry>,
}

impl From<SettingsOutcome> for SettingsResponse {
    fn from(outcome: SettingsOutcome) -> Self {
        let mut result = Vec::with_capacity(2);
        match outcome.share {
            Some(ShareResult::On { link }) => result.push(SettingsEntry::Share {
                share: "On",
                link: Some(link),
            }),
            Some(ShareResult::Off) => result.push(SettingsEntry::Share {
                share: "Off",
                link: None,
            }),
            None => {}
        }
        match outcome.rename {
            Some(RenameOutcome::Renamed) => result.push(SettingsEntry::Rename {
                rename: "Successfully renamed file".to_string(),
            }),
            Some(RenameOutcome::Failed(reason)) => result.push(SettingsEntry::Rename {
                rename: format!("Fail! {reason}"),
            }),
            None => {}
        }
        Self { result }
    }
}

/// One file in a browse listing.
#[derive(Debug, Serialize)]
pub struct FileEntry {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: i64,
    pub created_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
    pub folder_id: i64,
    pub folder_name: String,
}

impl From<FileSummary> for FileEntry {
    fn from(file: FileSummary) -> Self {
        Self {
            id: file.id,
            name: file.name,
            content_type: file.content_type,
            size: file.size,
            created_date: file.created_at,
            updated_date: file.updated_at,
            folder_id: file.folder_id,
            folder_name: file.folder_name,
        }
    }
}

/// Browse listing.
#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<FileEntry>,
}
