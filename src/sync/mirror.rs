//! Optimistic in-memory copy of the session's root records.
//!
//! Entries are replaced wholesale, never edited in place, so a snapshot
//! taken before an operation is always a valid rollback target.

use crate::types::RootRecord;
use std::collections::HashMap;
use std::sync::Mutex;

/// One decoded [`RootRecord`] per root id.
pub struct Mirror {
    roots: Mutex<HashMap<String, RootRecord>>,
}

impl Mirror {
    pub fn new() -> Self {
        Self {
            roots: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, root_id: &str) -> Option<RootRecord> {
        let roots = self.roots.lock().unwrap();
        roots.get(root_id).cloned()
    }

    pub fn contains(&self, root_id: &str) -> bool {
        let roots = self.roots.lock().unwrap();
        roots.contains_key(root_id)
    }

    /// All entries, newest first.
    pub fn list(&self) -> Vec<RootRecord> {
        let roots = self.roots.lock().unwrap();
        let mut list: Vec<RootRecord> = roots.values().cloned().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        list
    }

    pub fn len(&self) -> usize {
        self.roots.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert or replace an entry. Returns the previous value.
    pub fn upsert(&self, record: RootRecord) -> Option<RootRecord> {
        let mut roots = self.roots.lock().unwrap();
        roots.insert(record.id.clone(), record)
    }

    pub fn remove(&self, root_id: &str) -> Option<RootRecord> {
        let mut roots = self.roots.lock().unwrap();
        roots.remove(root_id)
    }

    /// Put back a snapshot taken with [`get`](Self::get). `None` means the
    /// root was not mirrored, so any entry is dropped.
    pub fn restore(&self, root_id: &str, snapshot: Option<RootRecord>) {
        let mut roots = self.roots.lock().unwrap();
        match snapshot {
            Some(record) => {
                roots.insert(root_id.to_string(), record);
            }
            None => {
                roots.remove(root_id);
            }
        }
    }

    /// Replace every entry with an authoritative listing.
    pub fn replace_all(&self, records: Vec<RootRecord>) {
        let mut roots = self.roots.lock().unwrap();
        roots.clear();
        roots.extend(records.into_iter().map(|r| (r.id.clone(), r)));
    }
}

impl Default for Mirror {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, created_at: i64) -> RootRecord {
        RootRecord {
            id: id.to_string(),
            title: format!("Root {}", id),
            description: None,
            is_completed: false,
            owner_id: "u1".to_string(),
            children: Vec::new(),
            created_at,
            updated_at: created_at,
            tree_unreadable: false,
        }
    }

    #[test]
    fn upsert_returns_previous() {
        let mirror = Mirror::new();
        assert!(mirror.upsert(record("a", 1)).is_none());

        let mut changed = record("a", 1);
        changed.is_completed = true;
        let previous = mirror.upsert(changed).unwrap();
        assert!(!previous.is_completed);
        assert!(mirror.get("a").unwrap().is_completed);
    }

    #[test]
    fn restore_snapshot_undoes_change() {
        let mirror = Mirror::new();
        mirror.upsert(record("a", 1));
        let snapshot = mirror.get("a");

        let mut changed = record("a", 1);
        changed.title = "edited".into();
        mirror.upsert(changed);
        mirror.restore("a", snapshot);

        assert_eq!(mirror.get("a").unwrap().title, "Root a");
    }

    #[test]
    fn restore_none_drops_entry() {
        let mirror = Mirror::new();
        mirror.upsert(record("a", 1));
        mirror.restore("a", None);
        assert!(!mirror.contains("a"));
    }

    #[test]
    fn list_is_newest_first() {
        let mirror = Mirror::new();
        mirror.replace_all(vec![record("old", 1), record("new", 5), record("mid", 3)]);
        let ids: Vec<String> = mirror.list().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn replace_all_drops_stale_entries() {
        let mirror = Mirror::new();
        mirror.upsert(record("stale", 1));
        mirror.replace_all(vec![record("fresh", 2)]);
        assert_eq!(mirror.len(), 1);
        assert!(mirror.contains("fresh"));
    }
}
