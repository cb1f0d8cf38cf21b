//! Resource ownership rules.
//!
//! Pure checks with no IO: handlers load the owner field from storage and
//! ask these functions whether the authenticated subject may proceed.

use crate::types::{AppError, Result};

/// Succeeds only when `subject` is the recorded `owner` of the resource.
pub fn ensure_owner(subject: u64, owner: u64, message: &str) -> Result<()> {
    if subject != owner {
        return Err(AppError::Forbidden(message.to_string()));
    }
    Ok(())
}

/// Succeeds only when `subject` and `target` are different users.
///
/// Used for follow-graph edits, which may never point a user at themself.
pub fn ensure_not_self(subject: u64, target: u64, message: &str) -> Result<()> {
    if subject == target {
        return Err(AppError::Forbidden(message.to_string()));
    }
    Ok(())
}
