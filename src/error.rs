//! Structured errors surfaced by synchronizer operations.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    DepthExceeded,

    // Not found errors
    RootNotFound,
    NodeNotFound,

    // Precondition violations
    NotOwner,
    TreeUnreadable,

    // Storage errors
    PersistenceFailed,

    // Internal errors
    InternalError,
}

/// Structured error returned by the synchronizer.
#[derive(Debug, Serialize)]
pub struct SyncError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl SyncError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn depth_exceeded(parent_id: &str, max_depth: usize) -> Self {
        Self::new(
            ErrorCode::DepthExceeded,
            format!(
                "Cannot add a subtask under {}: maximum depth of {} reached",
                parent_id, max_depth
            ),
        )
        .with_field("parent_id")
    }

    pub fn root_not_found(root_id: &str) -> Self {
        Self::new(
            ErrorCode::RootNotFound,
            format!("Task not found: {}", root_id),
        )
    }

    pub fn node_not_found(root_id: &str, node_id: &str) -> Self {
        Self::new(
            ErrorCode::NodeNotFound,
            format!("Subtask {} not found under task {}", node_id, root_id),
        )
    }

    pub fn not_owner(root_id: &str, owner_id: &str) -> Self {
        Self::new(
            ErrorCode::NotOwner,
            format!("User {} does not own task {}", owner_id, root_id),
        )
    }

    pub fn tree_unreadable(root_id: &str) -> Self {
        Self::new(
            ErrorCode::TreeUnreadable,
            format!(
                "Subtasks of task {} could not be read; only the task itself can be edited",
                root_id
            ),
        )
        .with_field("subtasks")
    }

    pub fn persistence(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::PersistenceFailed, "Failed to save changes; please retry")
            .with_details(err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }

    /// Whether repeating the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.code, ErrorCode::PersistenceFailed)
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SyncError {}

impl From<crate::store::StoreError> for SyncError {
    fn from(err: crate::store::StoreError) -> Self {
        SyncError::persistence(err)
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for SyncError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<SyncError>() {
            Ok(sync_err) => sync_err,
            Err(err) => SyncError::internal(err),
        }
    }
}

/// Result type for synchronizer operations.
pub type SyncResult<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_screaming_snake() {
        let err = SyncError::depth_exceeded("n1", 3);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "DEPTH_EXCEEDED");
        assert_eq!(json["field"], "parent_id");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn only_persistence_failures_are_retryable() {
        assert!(SyncError::persistence("disk full").is_retryable());
        assert!(!SyncError::depth_exceeded("n", 3).is_retryable());
        assert!(!SyncError::not_owner("r", "u").is_retryable());
        assert!(!SyncError::tree_unreadable("r").is_retryable());
    }

    #[test]
    fn persistence_keeps_cause_in_details() {
        let err = SyncError::persistence("connection reset");
        assert_eq!(err.details.as_deref(), Some("connection reset"));
    }

    #[test]
    fn anyhow_roundtrip_keeps_code() {
        let err: anyhow::Error = SyncError::root_not_found("r1").into();
        let back: SyncError = err.into();
        assert_eq!(back.code, ErrorCode::RootNotFound);
    }
}
