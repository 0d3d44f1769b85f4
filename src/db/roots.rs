//! Root record CRUD and listing.

use super::{Database, now_ms};
use crate::codec::{self, EMPTY_BLOB};
use crate::store::StoreError;
use crate::types::{NewRoot, RootPatch, RootQuery, RootRecord};
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

const ROOT_COLUMNS: &str =
    "id, title, description, is_completed, owner_id, subtasks, created_at, updated_at";

/// Parse a `roots` row. A corrupt blob still yields a usable record with an
/// empty tree, flagged so that tree writes are refused.
fn parse_root_row(row: &Row) -> rusqlite::Result<RootRecord> {
    let id: String = row.get("id")?;
    let subtasks: Option<String> = row.get("subtasks")?;
    let decoded = codec::decode_column(&id, subtasks.as_deref());
    let tree_unreadable = decoded.is_none();

    Ok(RootRecord {
        title: row.get("title")?,
        description: row.get("description")?,
        is_completed: row.get("is_completed")?,
        owner_id: row.get("owner_id")?,
        children: decoded.unwrap_or_default(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        tree_unreadable,
        id,
    })
}

fn get_root_internal(conn: &Connection, root_id: &str) -> Result<Option<RootRecord>, StoreError> {
    let sql = format!("SELECT {} FROM roots WHERE id = ?1", ROOT_COLUMNS);
    let root = conn
        .query_row(&sql, params![root_id], parse_root_row)
        .optional()?;
    Ok(root)
}

/// Escape `%`, `_` and the escape character itself for a LIKE pattern.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

impl Database {
    /// Create a root with an empty tree. The id is generated here.
    pub fn create_root(&self, fields: NewRoot) -> Result<RootRecord, StoreError> {
        let id = Uuid::now_v7().to_string();
        let now = now_ms();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO roots (id, title, description, is_completed, owner_id, subtasks, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, ?6)",
                params![id, fields.title, fields.description, fields.owner_id, EMPTY_BLOB, now],
            )?;
            Ok(())
        })?;

        Ok(RootRecord {
            id,
            title: fields.title,
            description: fields.description,
            is_completed: false,
            owner_id: fields.owner_id,
            children: Vec::new(),
            created_at: now,
            updated_at: now,
            tree_unreadable: false,
        })
    }

    /// Get a root by id.
    pub fn get_root(&self, root_id: &str) -> Result<Option<RootRecord>, StoreError> {
        self.with_conn(|conn| get_root_internal(conn, root_id))
    }

    /// Overwrite the fields present in `patch` and bump `updated_at`.
    ///
    /// `children` replaces the whole blob; there is no partial tree write.
    pub fn update_root(&self, root_id: &str, patch: &RootPatch) -> Result<(), StoreError> {
        let now = now_ms();
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            if let Some(title) = &patch.title {
                tx.execute(
                    "UPDATE roots SET title = ?1 WHERE id = ?2",
                    params![title, root_id],
                )?;
            }
            if let Some(description) = &patch.description {
                tx.execute(
                    "UPDATE roots SET description = ?1 WHERE id = ?2",
                    params![description, root_id],
                )?;
            }
            if let Some(is_completed) = patch.is_completed {
                tx.execute(
                    "UPDATE roots SET is_completed = ?1 WHERE id = ?2",
                    params![is_completed, root_id],
                )?;
            }
            if let Some(children) = &patch.children {
                tx.execute(
                    "UPDATE roots SET subtasks = ?1 WHERE id = ?2",
                    params![children, root_id],
                )?;
            }
            let touched = tx.execute(
                "UPDATE roots SET updated_at = ?1 WHERE id = ?2",
                params![now, root_id],
            )?;
            if touched == 0 {
                return Err(StoreError::NotFound(root_id.to_string()));
            }
            tx.commit()?;
            Ok(())
        })
    }

    /// Delete a root and its whole encoded tree.
    pub fn delete_root(&self, root_id: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM roots WHERE id = ?1", params![root_id])?;
            if deleted == 0 {
                return Err(StoreError::NotFound(root_id.to_string()));
            }
            Ok(())
        })
    }

    /// List an owner's roots, newest first.
    ///
    /// The text filter also matches inside the raw blob, so a root shows up
    /// when any nested title contains the search term.
    pub fn list_roots(
        &self,
        owner_id: &str,
        query: &RootQuery,
    ) -> Result<Vec<RootRecord>, StoreError> {
        let pattern = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM roots
                 WHERE owner_id = ?1
                   AND (?2 IS NULL
                        OR title LIKE ?2 ESCAPE '\\'
                        OR description LIKE ?2 ESCAPE '\\'
                        OR subtasks LIKE ?2 ESCAPE '\\')
                   AND (?3 = 1 OR is_completed = 0)
                 ORDER BY created_at DESC, rowid DESC",
                ROOT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let roots = stmt
                .query_map(params![owner_id, pattern, query.show_completed], parse_root_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(roots)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskNode;

    fn setup_db() -> Database {
        Database::open_in_memory().expect("Failed to create in-memory database")
    }

    fn new_root(title: &str, owner: &str) -> NewRoot {
        NewRoot {
            title: title.to_string(),
            description: None,
            owner_id: owner.to_string(),
        }
    }

    #[test]
    fn create_then_get() {
        let db = setup_db();
        let created = db.create_root(new_root("Groceries", "u1")).unwrap();

        let loaded = db.get_root(&created.id).unwrap().unwrap();
        assert_eq!(loaded, created);
        assert!(loaded.children.is_empty());
        assert!(!loaded.tree_unreadable);
        assert!(!loaded.is_completed);
    }

    #[test]
    fn get_unknown_is_none() {
        let db = setup_db();
        assert!(db.get_root("missing").unwrap().is_none());
    }

    #[test]
    fn update_overwrites_blob_and_scalars() {
        let db = setup_db();
        let root = db.create_root(new_root("Trip", "u1")).unwrap();
        let tree = vec![TaskNode::new("n1", "Book flights").unwrap()];

        db.update_root(
            &root.id,
            &RootPatch {
                is_completed: Some(true),
                description: Some(Some("summer".into())),
                children: Some(codec::encode(&tree)),
                ..RootPatch::default()
            },
        )
        .unwrap();

        let loaded = db.get_root(&root.id).unwrap().unwrap();
        assert!(loaded.is_completed);
        assert_eq!(loaded.title, "Trip");
        assert_eq!(loaded.description.as_deref(), Some("summer"));
        assert_eq!(loaded.children, tree);
        assert!(loaded.updated_at >= root.updated_at);
    }

    #[test]
    fn update_unknown_is_not_found() {
        let db = setup_db();
        let err = db.update_root("missing", &RootPatch::children("[]".into())).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn corrupt_blob_reads_as_empty_tree() {
        let db = setup_db();
        let root = db.create_root(new_root("Broken", "u1")).unwrap();
        db.update_root(&root.id, &RootPatch::children("not valid blob".into()))
            .unwrap();

        let loaded = db.get_root(&root.id).unwrap().unwrap();
        assert!(loaded.children.is_empty());
        assert!(loaded.tree_unreadable);
        assert_eq!(loaded.title, "Broken");
    }

    #[test]
    fn delete_removes_row() {
        let db = setup_db();
        let root = db.create_root(new_root("Gone", "u1")).unwrap();
        db.delete_root(&root.id).unwrap();
        assert!(db.get_root(&root.id).unwrap().is_none());
        assert!(matches!(db.delete_root(&root.id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn list_filters_by_owner_search_and_completion() {
        let db = setup_db();
        let a = db.create_root(new_root("Paint fence", "u1")).unwrap();
        let b = db.create_root(new_root("Groceries", "u1")).unwrap();
        db.create_root(new_root("Paint house", "u2")).unwrap();

        let nested = vec![TaskNode::new("n", "Buy paint brushes").unwrap()];
        db.update_root(
            &b.id,
            &RootPatch {
                is_completed: Some(true),
                children: Some(codec::encode(&nested)),
                ..RootPatch::default()
            },
        )
        .unwrap();

        let all = db.list_roots("u1", &RootQuery::all()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, b.id, "newest first");

        let paint = db
            .list_roots(
                "u1",
                &RootQuery {
                    search: Some("PAINT".into()),
                    show_completed: true,
                },
            )
            .unwrap();
        assert_eq!(paint.len(), 2, "matches title and nested blob");

        let open = db
            .list_roots(
                "u1",
                &RootQuery {
                    search: None,
                    show_completed: false,
                },
            )
            .unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, a.id);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
