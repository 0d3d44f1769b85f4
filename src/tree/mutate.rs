//! Copy-on-write edits.
//!
//! Every ancestor of the edited node is rebuilt with a new `children`
//! vector. Untouched siblings are cloned into the new tree; callers must
//! not rely on any sharing between input and output.

use crate::types::TaskNode;

/// Outcome of an edit callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Put this node where the target was.
    Replace(TaskNode),
    /// Drop the target and its whole subtree.
    Remove,
}

/// Apply `edit` to the first node (pre-order) whose id is `target_id`.
///
/// If no node matches, the returned tree equals the input. `edit` runs at
/// most once.
pub fn update<F>(tree: &[TaskNode], target_id: &str, edit: F) -> Vec<TaskNode>
where
    F: FnOnce(&TaskNode) -> Edit,
{
    let mut edit = Some(edit);
    update_level(tree, target_id, &mut edit)
}

fn update_level<F>(tree: &[TaskNode], target_id: &str, edit: &mut Option<F>) -> Vec<TaskNode>
where
    F: FnOnce(&TaskNode) -> Edit,
{
    let mut out = Vec::with_capacity(tree.len());
    for node in tree {
        match edit.take() {
            // Already applied: the rest of the tree is copied as-is.
            None => out.push(node.clone()),
            Some(f) if node.id == target_id => {
                if let Edit::Replace(replacement) = f(node) {
                    out.push(replacement);
                }
            }
            Some(f) => {
                *edit = Some(f);
                let children = update_level(&node.children, target_id, edit);
                out.push(node.with_children(children));
            }
        }
    }
    out
}

/// Append `new_node` as the last child of the first node whose id is
/// `parent_id`. Unknown parents leave the tree unchanged.
///
/// The top-level list belongs to the root record, so appending to the root
/// itself is the caller's job.
pub fn insert(tree: &[TaskNode], parent_id: &str, new_node: TaskNode) -> Vec<TaskNode> {
    let mut pending = Some(new_node);
    insert_level(tree, parent_id, &mut pending)
}

fn insert_level(
    tree: &[TaskNode],
    parent_id: &str,
    pending: &mut Option<TaskNode>,
) -> Vec<TaskNode> {
    let mut out = Vec::with_capacity(tree.len());
    for node in tree {
        if pending.is_none() {
            out.push(node.clone());
        } else if node.id == parent_id {
            let mut children = node.children.clone();
            children.extend(pending.take());
            out.push(node.with_children(children));
        } else {
            let children = insert_level(&node.children, parent_id, pending);
            out.push(node.with_children(children));
        }
    }
    out
}

/// Remove the node `target_id` and everything below it.
pub fn remove(tree: &[TaskNode], target_id: &str) -> Vec<TaskNode> {
    update(tree, target_id, |_| Edit::Remove)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tree::find::{count, find};

    pub(crate) fn node(id: &str, children: Vec<TaskNode>) -> TaskNode {
        let mut n = TaskNode::new(id, &format!("Task {}", id)).unwrap();
        n.children = children;
        n
    }

    /// `[1 [1.1, 1.2 [1.2.1]], 2]`
    pub(crate) fn sample_tree() -> Vec<TaskNode> {
        vec![
            node(
                "1",
                vec![node("1.1", vec![]), node("1.2", vec![node("1.2.1", vec![])])],
            ),
            node("2", vec![]),
        ]
    }

    fn complete(n: &TaskNode) -> Edit {
        let mut n = n.clone();
        n.is_completed = true;
        Edit::Replace(n)
    }

    fn ids(tree: &[TaskNode]) -> Vec<&str> {
        tree.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn update_missing_id_is_noop() {
        let tree = sample_tree();
        assert_eq!(update(&tree, "999", complete), tree);
        assert_eq!(update(&tree, "999", |_| Edit::Remove), tree);
    }

    #[test]
    fn update_on_empty_tree_is_empty() {
        assert!(update(&[], "1", complete).is_empty());
        assert!(insert(&[], "1", node("x", vec![])).is_empty());
    }

    #[test]
    fn toggle_leaf_leaves_siblings_untouched() {
        let tree = sample_tree();
        let result = update(&tree, "1.2.1", complete);

        let parent = find(&result, "1.2").unwrap();
        assert_eq!(ids(&parent.children), vec!["1.2.1"]);
        assert!(parent.children[0].is_completed);

        assert_eq!(find(&result, "1.1"), find(&tree, "1.1"));
        assert_eq!(find(&result, "2"), find(&tree, "2"));
        assert!(!find(&result, "1").unwrap().is_completed);
        assert!(!find(&tree, "1.2.1").unwrap().is_completed, "input must not change");
    }

    #[test]
    fn toggle_preserves_ids_titles_and_order() {
        let tree = sample_tree();
        let result = update(&tree, "1", complete);

        assert_eq!(ids(&result), vec!["1", "2"]);
        let one = find(&result, "1").unwrap();
        assert!(one.is_completed);
        assert_eq!(one.title, "Task 1");
        assert_eq!(ids(&one.children), vec!["1.1", "1.2"]);
        assert_eq!(count(&result), count(&tree));
    }

    #[test]
    fn remove_drops_whole_subtree() {
        let tree = sample_tree();
        let result = remove(&tree, "1.2");

        assert!(find(&result, "1.2").is_none());
        assert!(find(&result, "1.2.1").is_none());
        assert_eq!(ids(&find(&result, "1").unwrap().children), vec!["1.1"]);
        assert_eq!(count(&result), 3);
    }

    #[test]
    fn remove_leaf_leaves_empty_parent() {
        let tree = sample_tree();
        let result = update(&tree, "1.2.1", |_| Edit::Remove);

        assert!(find(&result, "1.2").unwrap().children.is_empty());
        assert!(find(&result, "1.2.1").is_none());
    }

    #[test]
    fn remove_top_level_keeps_order() {
        let mut tree = sample_tree();
        tree.push(node("3", vec![]));
        let result = remove(&tree, "2");
        assert_eq!(ids(&result), vec!["1", "3"]);
    }

    #[test]
    fn only_first_duplicate_is_edited() {
        let mut tree = sample_tree();
        tree.push(node("1.1", vec![]));
        let result = update(&tree, "1.1", complete);

        assert!(find(&result, "1").unwrap().children[0].is_completed);
        assert!(!result[2].is_completed);
    }

    #[test]
    fn insert_appends_last() {
        let tree = sample_tree();
        let result = insert(&tree, "1", node("1.3", vec![]));

        assert_eq!(ids(&find(&result, "1").unwrap().children), vec!["1.1", "1.2", "1.3"]);
        assert!(find(&tree, "1.3").is_none(), "input must not change");
    }

    #[test]
    fn insert_into_nested_parent() {
        let tree = sample_tree();
        let result = insert(&tree, "1.2", node("1.2.2", vec![]));

        assert_eq!(ids(&find(&result, "1.2").unwrap().children), vec!["1.2.1", "1.2.2"]);
        assert_eq!(ids(&result), vec!["1", "2"]);
    }

    #[test]
    fn insert_unknown_parent_is_noop() {
        let tree = sample_tree();
        assert_eq!(insert(&tree, "999", node("x", vec![])), tree);
    }

    #[test]
    fn replace_can_swap_in_new_subtree() {
        let tree = sample_tree();
        let result = update(&tree, "2", |n| {
            Edit::Replace(n.with_children(vec![node("2.1", vec![])]))
        });
        assert_eq!(ids(&find(&result, "2").unwrap().children), vec!["2.1"]);
    }
}
