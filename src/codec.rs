//! Blob codec for the `subtasks` column.
//!
//! The whole tree below a root is stored as one JSON array string.
//! Decoding never fails outward: a missing, blank or malformed blob becomes
//! an empty tree so one bad record cannot block reads of the others.

use crate::types::TaskNode;
use tracing::warn;

/// Encoded form of an empty tree, written for new roots.
pub const EMPTY_BLOB: &str = "[]";

/// Encode a tree as a JSON array.
pub fn encode(children: &[TaskNode]) -> String {
    // Plain structs of strings, bools and timestamps always serialize.
    serde_json::to_string(children).unwrap_or_else(|_| EMPTY_BLOB.to_string())
}

/// Strict decode. Blank input is an empty tree, not an error.
pub fn try_decode(blob: &str) -> Result<Vec<TaskNode>, serde_json::Error> {
    if blob.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(blob)
}

/// Lenient decode: malformed input is logged and read as an empty tree.
pub fn decode(blob: &str) -> Vec<TaskNode> {
    decode_for("", blob)
}

/// Lenient decode that names the owning root in the log line.
pub fn decode_for(root_id: &str, blob: &str) -> Vec<TaskNode> {
    match try_decode(blob) {
        Ok(children) => children,
        Err(e) => {
            warn!(root_id = %root_id, error = %e, blob_len = blob.len(), "Failed to decode subtasks; using empty tree");
            Vec::new()
        }
    }
}

/// Decode an optional column value. A missing column is an empty tree;
/// `None` means the blob is present but unreadable, which is logged.
pub fn decode_column(root_id: &str, blob: Option<&str>) -> Option<Vec<TaskNode>> {
    let Some(blob) = blob else {
        return Some(Vec::new());
    };
    match try_decode(blob) {
        Ok(children) => Some(children),
        Err(e) => {
            warn!(root_id = %root_id, error = %e, blob_len = blob.len(), "Failed to decode subtasks; tree is read-only");
            None
        }
    }
}
