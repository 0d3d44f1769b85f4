//! Root record synchronizer.
//!
//! Every tree edit follows the same path: load the root, decode its blob,
//! apply a copy-on-write edit, encode, then overwrite the root's `subtasks`
//! field. Edits that target the root itself touch its scalar fields instead.
//! A root whose stored blob cannot be decoded accepts scalar edits only.
//!
//! The session's [`Mirror`] is updated before the store is called and is
//! reconciled from an authoritative reload afterwards. If any storage step
//! fails, the mirror entry is restored to its pre-operation snapshot and a
//! retryable [`SyncError`] is returned.
//!
//! # Known limitation
//!
//! Persistence is a whole-field overwrite with no version check. Operations
//! from this session are queued per root, but two sessions editing different
//! branches of the same root can still lose one of the edits.

mod mirror;
mod queue;

pub use mirror::Mirror;
pub use queue::RootLocks;

use crate::codec;
use crate::error::{ErrorCode, SyncError, SyncResult};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::store::{RootStore, StoreError};
use crate::tree::{self, DepthPolicy, Edit};
use crate::types::{
    NewRoot, RootPatch, RootQuery, RootRecord, TaskNode, normalize_description, validate_title,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which part of the root record an operation writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// `title`, `description`, `is_completed` on the root itself.
    Scalars,
    /// The encoded `subtasks` blob.
    Tree,
}

/// One user's session against a [`RootStore`].
pub struct Synchronizer {
    store: Arc<dyn RootStore>,
    ids: Arc<dyn IdGenerator>,
    depth: DepthPolicy,
    owner_id: String,
    mirror: Mirror,
    locks: RootLocks,
}

impl Synchronizer {
    pub fn new(store: Arc<dyn RootStore>, owner_id: impl Into<String>) -> Self {
        Self {
            store,
            ids: Arc::new(UuidGenerator),
            depth: DepthPolicy::default(),
            owner_id: owner_id.into(),
            mirror: Mirror::new(),
            locks: RootLocks::new(),
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_depth_policy(mut self, depth: DepthPolicy) -> Self {
        self.depth = depth;
        self
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn depth_policy(&self) -> DepthPolicy {
        self.depth
    }

    pub fn mirror(&self) -> &Mirror {
        &self.mirror
    }

    /// Reload the owner's roots and replace the mirror with the result.
    pub async fn refresh(&self, query: &RootQuery) -> SyncResult<Vec<RootRecord>> {
        let roots = self
            .store
            .list_roots(&self.owner_id, query)
            .await
            .map_err(|e| {
                warn!(owner_id = %self.owner_id, error = %e, "Failed to list roots");
                SyncError::persistence(e)
            })?;
        debug!(owner_id = %self.owner_id, count = roots.len(), "Mirror refreshed");
        self.mirror.replace_all(roots.clone());
        Ok(roots)
    }

    /// Create a root with an empty tree, owned by this session's user.
    pub async fn create_root(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> SyncResult<RootRecord> {
        let title = validate_title(title).map_err(|_| SyncError::missing_field("title"))?;
        let fields = NewRoot {
            title,
            description: normalize_description(description),
            owner_id: self.owner_id.clone(),
        };

        let root = self.store.create_root(fields).await.map_err(|e| {
            warn!(owner_id = %self.owner_id, error = %e, "Failed to create root");
            SyncError::persistence(e)
        })?;

        info!(root_id = %root.id, "Root created");
        self.mirror.upsert(root.clone());
        Ok(root)
    }

    /// Set `is_completed` on the root or on a nested node.
    pub async fn toggle(
        &self,
        root_id: &str,
        target_id: &str,
        is_completed: bool,
    ) -> SyncResult<RootRecord> {
        if target_id == root_id {
            return self
                .run("toggle", root_id, target_id, Scope::Scalars, |root| {
                    let mut next = root.clone();
                    next.is_completed = is_completed;
                    Ok(next)
                })
                .await;
        }

        self.run("toggle", root_id, target_id, Scope::Tree, |root| {
            edit_node(root, target_id, |node| {
                let mut node = node.clone();
                node.is_completed = is_completed;
                Edit::Replace(node)
            })
        })
        .await
    }

    /// Replace the title and description of the root or a nested node.
    pub async fn edit(
        &self,
        root_id: &str,
        target_id: &str,
        title: &str,
        description: Option<&str>,
    ) -> SyncResult<RootRecord> {
        let title = validate_title(title).map_err(|_| SyncError::missing_field("title"))?;
        let description = normalize_description(description);

        let scope = if target_id == root_id {
            Scope::Scalars
        } else {
            Scope::Tree
        };

        self.run("edit", root_id, target_id, scope, |root| {
            if scope == Scope::Scalars {
                let mut next = root.clone();
                next.title = title.clone();
                next.description = description.clone();
                return Ok(next);
            }
            edit_node(root, target_id, |node| {
                let mut node = node.clone();
                node.title = title.clone();
                node.description = description.clone();
                Edit::Replace(node)
            })
        })
        .await
    }

    /// Delete a nested node with its subtree, or the whole root record.
    ///
    /// Returns the updated root, or `None` when the root itself was deleted.
    pub async fn delete(&self, root_id: &str, target_id: &str) -> SyncResult<Option<RootRecord>> {
        if target_id == root_id {
            self.delete_root(root_id).await?;
            return Ok(None);
        }

        self.run("delete", root_id, target_id, Scope::Tree, |root| {
            edit_node(root, target_id, |_| Edit::Remove)
        })
        .await
        .map(Some)
    }

    /// Append a new node titled `title` under `parent_id` (the root or any
    /// nested node). Rejected with `DEPTH_EXCEEDED` before any write when the
    /// parent already sits at the maximum depth.
    pub async fn add_subtask(
        &self,
        root_id: &str,
        parent_id: &str,
        title: &str,
    ) -> SyncResult<TaskNode> {
        let title = validate_title(title).map_err(|_| SyncError::missing_field("title"))?;
        let node = TaskNode::new(self.ids.new_id(), &title)
            .map_err(|_| SyncError::missing_field("title"))?;

        self.run("add_subtask", root_id, parent_id, Scope::Tree, |root| {
            if tree::find(&root.children, &node.id).is_some() {
                return Err(SyncError::internal(format!(
                    "Generated id {} already exists under task {}",
                    node.id, root.id
                )));
            }

            if parent_id == root.id {
                self.check_depth(parent_id, 0)?;
                let mut children = root.children.clone();
                children.push(node.clone());
                return Ok(root.with_children(children));
            }

            let depth = tree::depth_of(&root.children, parent_id)
                .ok_or_else(|| SyncError::node_not_found(&root.id, parent_id))?;
            self.check_depth(parent_id, depth)?;
            Ok(root.with_children(tree::insert(&root.children, parent_id, node.clone())))
        })
        .await?;

        Ok(node)
    }

    fn check_depth(&self, parent_id: &str, depth: usize) -> SyncResult<()> {
        if self.depth.can_attach_at(depth) {
            Ok(())
        } else {
            Err(SyncError::depth_exceeded(parent_id, self.depth.max_depth()))
        }
    }

    async fn delete_root(&self, root_id: &str) -> SyncResult<()> {
        let _guard = self.locks.lock(root_id).await;

        let snapshot = self.mirror.remove(root_id);
        let result = self.delete_root_in_store(root_id).await;
        match result {
            Ok(()) => {
                info!(root_id = %root_id, "Root deleted");
                Ok(())
            }
            Err(e) => {
                if e.code != ErrorCode::RootNotFound {
                    self.mirror.restore(root_id, snapshot);
                }
                warn!(root_id = %root_id, error = %e, "Root delete failed");
                Err(e)
            }
        }
    }

    async fn delete_root_in_store(&self, root_id: &str) -> SyncResult<()> {
        let root = self.load_owned(root_id).await?;
        match self.store.delete_root(&root.id).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound(_)) => Err(SyncError::root_not_found(root_id)),
            Err(e) => Err(SyncError::persistence(e)),
        }
    }

    /// Load `root_id` and check it belongs to this session's owner.
    async fn load_owned(&self, root_id: &str) -> SyncResult<RootRecord> {
        let root = self
            .store
            .load_root(root_id)
            .await
            .map_err(SyncError::persistence)?
            .ok_or_else(|| SyncError::root_not_found(root_id))?;

        if root.owner_id != self.owner_id {
            return Err(SyncError::not_owner(root_id, &self.owner_id));
        }
        Ok(root)
    }

    /// Shared read-modify-write path.
    ///
    /// `plan` computes the next state of a root from a current one. It runs
    /// once against the mirror (optimistic) and once against the freshly
    /// loaded record (authoritative); only the latter is persisted.
    async fn run<F>(
        &self,
        op: &'static str,
        root_id: &str,
        target_id: &str,
        scope: Scope,
        plan: F,
    ) -> SyncResult<RootRecord>
    where
        F: Fn(&RootRecord) -> SyncResult<RootRecord>,
    {
        let _guard = self.locks.lock(root_id).await;

        let snapshot = self.mirror.get(root_id);
        if let Some(current) = &snapshot {
            match check_writable(scope, current).and_then(|()| plan(current)) {
                Ok(next) => {
                    self.mirror.upsert(next);
                    debug!(op, root_id = %root_id, target_id = %target_id, "Optimistic update applied");
                }
                Err(e) => {
                    debug!(op, root_id = %root_id, target_id = %target_id, error = %e, "Skipping optimistic update");
                }
            }
        }

        match self.write_through(root_id, scope, &plan).await {
            Ok(written) => {
                info!(op, root_id = %root_id, target_id = %target_id, "Root updated");
                Ok(self.reconcile(root_id, written).await)
            }
            Err(e) => {
                if e.code == ErrorCode::RootNotFound {
                    self.mirror.remove(root_id);
                } else {
                    self.mirror.restore(root_id, snapshot);
                }
                warn!(op, root_id = %root_id, target_id = %target_id, code = ?e.code, error = %e, "Root update failed; mirror rolled back");
                Err(e)
            }
        }
    }

    async fn write_through<F>(
        &self,
        root_id: &str,
        scope: Scope,
        plan: &F,
    ) -> SyncResult<RootRecord>
    where
        F: Fn(&RootRecord) -> SyncResult<RootRecord>,
    {
        let current = self.load_owned(root_id).await?;
        check_writable(scope, &current)?;
        let next = plan(&current)?;
        let patch = patch_for(scope, &current, &next);

        match self.store.persist_root(root_id, patch).await {
            Ok(()) => Ok(next),
            Err(StoreError::NotFound(_)) => Err(SyncError::root_not_found(root_id)),
            Err(e) => Err(SyncError::persistence(e)),
        }
    }

    /// Replace the mirror entry with the stored record. If the reload
    /// fails, the locally computed state stands in until the next refresh.
    async fn reconcile(&self, root_id: &str, written: RootRecord) -> RootRecord {
        match self.store.load_root(root_id).await {
            Ok(Some(stored)) => {
                self.mirror.upsert(stored.clone());
                stored
            }
            Ok(None) => {
                warn!(root_id = %root_id, "Root vanished after write");
                self.mirror.remove(root_id);
                written
            }
            Err(e) => {
                warn!(root_id = %root_id, error = %e, "Reload after write failed; keeping local state");
                self.mirror.upsert(written.clone());
                written
            }
        }
    }
}

/// Refuse tree writes to a root whose stored blob could not be decoded, so
/// the unreadable blob is never replaced by an edit of the empty fallback.
fn check_writable(scope: Scope, root: &RootRecord) -> SyncResult<()> {
    if scope == Scope::Tree && root.tree_unreadable {
        return Err(SyncError::tree_unreadable(&root.id));
    }
    Ok(())
}

/// Apply `edit` to `target_id` inside the root's tree. A target missing from
/// the tree is reported instead of writing back an unchanged blob.
fn edit_node<F>(root: &RootRecord, target_id: &str, edit: F) -> SyncResult<RootRecord>
where
    F: FnOnce(&TaskNode) -> Edit,
{
    if tree::find(&root.children, target_id).is_none() {
        return Err(SyncError::node_not_found(&root.id, target_id));
    }
    Ok(root.with_children(tree::update(&root.children, target_id, edit)))
}

fn patch_for(scope: Scope, before: &RootRecord, after: &RootRecord) -> RootPatch {
    match scope {
        Scope::Tree => RootPatch::children(codec::encode(&after.children)),
        Scope::Scalars => RootPatch {
            title: (after.title != before.title).then(|| after.title.clone()),
            description: (after.description != before.description)
                .then(|| after.description.clone()),
            is_completed: (after.is_completed != before.is_completed).then_some(after.is_completed),
            children: None,
        },
    }
}
