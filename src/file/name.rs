//! Folder and file name rules.
//!
//! Every folder name and stored file name becomes exactly one path segment
//! under the storage root, so names that could escape it are rejected.

use thiserror::Error;

use crate::FiledockError;

/// Maximum length of a single name in bytes (common filesystem limit).
pub const MAX_NAME_BYTES: usize = 255;

/// Name validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Name is empty.
    #[error("name cannot be empty")]
    Empty,

    /// Name exceeds the byte limit.
    #[error("name must be at most {MAX_NAME_BYTES} bytes")]
    TooLong,

    /// Name contains a path separator, NUL or control character.
    #[error("name contains an invalid character {0:?}")]
    InvalidChar(char),

    /// Name is `.` or `..`.
    #[error("name cannot be a relative path component")]
    Reserved,
}

/// Validate a name that will be used as a single path segment.
pub fn validate_segment(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.len() > MAX_NAME_BYTES {
        return Err(NameError::TooLong);
    }
    if name == "." || name == ".." {
        return Err(NameError::Reserved);
    }
    if let Some(c) = name
        .chars()
        .find(|c| *c == '/' || *c == '\\' || c.is_control())
    {
        return Err(NameError::InvalidChar(c));
    }
    Ok(())
}

/// Validate a segment, reporting failures as validation errors naming `what`.
pub fn require_segment(what: &str, name: &str) -> crate::Result<()> {
    validate_segment(name).map_err(|e| FiledockError::Validation(format!("invalid {what}: {e}")))
}

/// An uploaded file name split into its logical name and extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitName<'a> {
    /// Name without the last extension.
    pub stem: &'a str,
    /// Last extension without the dot; empty when there is none.
    pub extension: &'a str,
}

impl<'a> SplitName<'a> {
    /// Split on the last dot.
    ///
    /// A leading dot does not start an extension, and neither does a
    /// trailing one, so the stem is never empty for a non-empty name.
    pub fn parse(full_name: &'a str) -> Self {
        match full_name.rfind('.') {
            Some(idx) if idx > 0 && idx + 1 < full_name.len() => Self {
                stem: &full_name[..idx],
                extension: &full_name[idx + 1..],
            },
            _ => Self {
                stem: full_name,
                extension: "",
            },
        }
    }
}

/// Extension of a stored file, given its logical and stored names.
///
/// The logical name is a prefix of the stored name, so whatever follows it
/// is the extension, even when the logical name itself contains dots.
pub fn extension_of<'a>(name: &str, full_name: &'a str) -> &'a str {
    if full_name == name {
        return "";
    }
    full_name
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or_else(|| SplitName::parse(full_name).extension)
}

/// Join a logical name and an extension into a stored name.
pub fn join_name(stem: &str, extension: &str) -> String {
    if extension.is_empty() {
        stem.to_string()
    } else {
        format!("{stem}.{extension}")
    }
}
