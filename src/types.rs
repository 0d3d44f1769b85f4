//! Core types: nested task nodes and the root records that own them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A nested task inside a root record's tree.
///
/// Field names on the wire match the blob format stored in the `subtasks`
/// column, so blobs written by earlier clients decode unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskNode {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    /// Ordered children. Insertion order is significant.
    #[serde(rename = "subtasks", default)]
    pub children: Vec<TaskNode>,
    pub created_at: DateTime<Utc>,
}

impl TaskNode {
    /// Create a fresh, incomplete node with no children.
    ///
    /// The title is trimmed and must not be empty. The id is supplied by the
    /// caller (normally an [`IdGenerator`](crate::ids::IdGenerator)).
    pub fn new(id: impl Into<String>, title: &str) -> Result<Self, InvalidTitle> {
        let title = validate_title(title)?;
        Ok(Self {
            id: id.into(),
            title,
            description: None,
            is_completed: false,
            children: Vec::new(),
            created_at: Utc::now(),
        })
    }

    /// Copy of this node's scalar fields with the given children.
    ///
    /// Used by the mutator to rebuild an ancestor without cloning the
    /// subtree it is about to replace.
    pub fn with_children(&self, children: Vec<TaskNode>) -> Self {
        Self {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            is_completed: self.is_completed,
            children,
            created_at: self.created_at,
        }
    }

    pub fn progress(&self) -> Progress {
        Progress::of(&self.children)
    }
}

/// The top-level persisted unit. Its `children` live in a single encoded
/// column; everything else is a plain scalar field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootRecord {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub owner_id: String,
    pub children: Vec<TaskNode>,
    pub created_at: i64,
    pub updated_at: i64,
    /// Set when the stored blob could not be decoded. `children` is then
    /// empty and only the scalar fields may be written.
    #[serde(skip)]
    pub tree_unreadable: bool,
}

impl RootRecord {
    /// Copy of this record's scalar fields with the given tree.
    pub fn with_children(&self, children: Vec<TaskNode>) -> Self {
        Self {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            is_completed: self.is_completed,
            owner_id: self.owner_id.clone(),
            children,
            created_at: self.created_at,
            updated_at: self.updated_at,
            tree_unreadable: false,
        }
    }

    pub fn progress(&self) -> Progress {
        Progress::of(&self.children)
    }
}

/// Fields for creating a root record. The store assigns the id and
/// timestamps and starts the tree empty.
#[derive(Debug, Clone)]
pub struct NewRoot {
    pub title: String,
    pub description: Option<String>,
    pub owner_id: String,
}

/// Partial update of a root record. `None` leaves a field untouched.
///
/// `children` is always the codec's encoded form; the store never looks
/// inside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub is_completed: Option<bool>,
    pub children: Option<String>,
}

impl RootPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.is_completed.is_none()
            && self.children.is_none()
    }

    pub fn children(blob: String) -> Self {
        Self {
            children: Some(blob),
            ..Self::default()
        }
    }
}

/// Filter for listing an owner's roots.
#[derive(Debug, Clone, Default)]
pub struct RootQuery {
    /// Case-insensitive substring over title, description and the raw blob.
    pub search: Option<String>,
    /// When false, completed roots are left out.
    pub show_completed: bool,
}

impl RootQuery {
    pub fn all() -> Self {
        Self {
            search: None,
            show_completed: true,
        }
    }
}

/// Completion over immediate children. Always derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn of(children: &[TaskNode]) -> Self {
        Self {
            completed: children.iter().filter(|c| c.is_completed).count(),
            total: children.len(),
        }
    }

    /// Percentage in `0..=100`; an empty list counts as 0.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            0
        } else {
            ((self.completed * 100) / self.total) as u8
        }
    }
}

/// Returned when a title is blank after trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("title must not be empty")]
pub struct InvalidTitle;

/// Trim a title and reject it if nothing is left.
pub fn validate_title(title: &str) -> Result<String, InvalidTitle> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        Err(InvalidTitle)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Blank descriptions are stored as absent.
pub fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}
