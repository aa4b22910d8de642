//! Scope checks.

use crate::db::{ADMIN_SCOPE, WILDCARD_SCOPE};

/// Scope for read-only endpoints.
pub const READ: &str = "read";

/// Scope for mutating endpoints.
pub const WRITE: &str = "write";

/// Whether `granted` covers every scope in `required`.
///
/// The wildcard and admin scopes cover everything; otherwise each required
/// scope must be granted literally.
pub fn has_scopes(granted: &[String], required: &[&str]) -> bool {
    if granted
        .iter()
        .any(|s| s == WILDCARD_SCOPE || s == ADMIN_SCOPE)
    {
        return true;
    }
    required
        .iter()
        .all(|needed| granted.iter().any(|s| s == needed))
}
