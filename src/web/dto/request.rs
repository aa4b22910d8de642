//! Request DTOs for Web API.

use serde::Deserialize;
use validator::Validate;

use super::validation::{not_empty_trimmed, path_segment};
use crate::file::BrowseFilters;

/// A field that accepts either a single value or a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

/// User registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 63, message = "Username must be 1-63 characters"))]
    pub username: String,
    /// Length rules are enforced by the password policy.
    pub password: String,
    #[validate(
        length(min = 1, max = 128, message = "Full name must be 1-128 characters"),
        custom(function = "not_empty_trimmed")
    )]
    pub full_name: String,
    #[validate(range(min = 0, message = "Age cannot be negative"))]
    #[serde(default)]
    pub age: Option<i32>,
}

/// Login form (`application/x-www-form-urlencoded`).
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Folder create/delete request: `{"name": "Docs"}` or `{"name": ["A", "B"]}`.
#[derive(Debug, Deserialize)]
pub struct FolderNamesRequest {
    pub name: OneOrMany<String>,
}

/// Folder rename request.
#[derive(Debug, Deserialize, Validate)]
pub struct FolderRenameRequest {
    #[validate(length(min = 1, message = "Old name must not be empty"))]
    pub old_name: String,
    #[validate(custom(function = "path_segment"))]
    pub new_name: String,
}

/// File settings request. At least one of `share` and `rename` is required.
#[derive(Debug, Deserialize)]
pub struct FileSettingsRequest {
    pub file_id: i64,
    #[serde(default)]
    pub share: Option<bool>,
    #[serde(default)]
    pub rename: Option<String>,
}

/// File delete request: `{"file_id": 1}` or `{"file_id": [1, 2]}`.
#[derive(Debug, Deserialize)]
pub struct FileDeleteRequest {
    pub file_id: OneOrMany<i64>,
}

/// File move request.
#[derive(Debug, Deserialize)]
pub struct FileMoveRequest {
    pub file_id: i64,
    pub folder_id: i64,
}

/// Browse request. The whole body is optional.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct BrowseRequest {
    #[validate(length(max = 255, message = "Name pattern must be at most 255 characters"))]
    #[serde(default)]
    pub name_pattern: Option<String>,
    #[serde(default)]
    pub filters: Option<BrowseFilters>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::SizeOrder;

    #[test]
    fn test_one_or_many() {
        let one: FolderNamesRequest = serde_json::from_str(r#"{"name":"Docs"}"#).unwrap();
        assert_eq!(one.name, OneOrMany::One("Docs".to_string()));

        let many: FolderNamesRequest = serde_json::from_str(r#"{"name":["A","B"]}"#).unwrap();
        assert_eq!(
            many.name,
            OneOrMany::Many(vec!["A".to_string(), "B".to_string()])
        );

        let id: FileDeleteRequest = serde_json::from_str(r#"{"file_id":7}"#).unwrap();
        assert_eq!(id.file_id, OneOrMany::One(7));

        let ids: FileDeleteRequest = serde_json::from_str(r#"{"file_id":[3,1]}"#).unwrap();
        assert_eq!(ids.file_id, OneOrMany::Many(vec![3, 1]));

        assert!(serde_json::from_str::<FileDeleteRequest>(r#"{"file_id":"x"}"#).is_err());
    }

    #[test]
    fn test_register_validation() {
        let ok: RegisterRequest = serde_json::from_str(
            r#"{"username":"alice","password":"password123","full_name":"Alice"}"#,
        )
        .unwrap();
        assert!(ok.validate().is_ok());
        assert_eq!(ok.age, None);

        let long = RegisterRequest {
            username: "a".repeat(64),
            password: "password123".into(),
            full_name: "A".into(),
            age: None,
        };
        assert!(long.validate().is_err());

        let negative = RegisterRequest {
            username: "bob".into(),
            password: "password123".into(),
            full_name: "Bob".into(),
            age: Some(-1),
        };
        assert!(negative.validate().is_err());
    }

    #[test]
    fn test_folder_rename_validation() {
        let bad = FolderRenameRequest {
            old_name: "Docs".into(),
            new_name: "../escape".into(),
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("new_name"));
    }

    #[test]
    fn test_browse_request() {
        let req: BrowseRequest = serde_json::from_str(
            r#"{"name_pattern":"rep","filters":{"size":"end","type":true}}"#,
        )
        .unwrap();
        let filters = req.filters.unwrap();
        assert_eq!(filters.size, Some(SizeOrder::End));
        assert!(filters.content_type);
        assert!(!filters.name);

        let empty: BrowseRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.name_pattern.is_none());
        assert!(empty.filters.is_none());
    }
}
