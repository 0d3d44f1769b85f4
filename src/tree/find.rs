//! Read-only navigation.

use crate::types::TaskNode;

/// Depth-first, pre-order search for `target_id`. Returns the first match.
pub fn find<'a>(tree: &'a [TaskNode], target_id: &str) -> Option<&'a TaskNode> {
    for node in tree {
        if node.id == target_id {
            return Some(node);
        }
        if let Some(found) = find(&node.children, target_id) {
            return Some(found);
        }
    }
    None
}

/// Depth of `target_id` counted from the owning root (depth 0), so
/// top-level nodes sit at depth 1.
pub fn depth_of(tree: &[TaskNode], target_id: &str) -> Option<usize> {
    depth_from(tree, target_id, 1)
}

fn depth_from(tree: &[TaskNode], target_id: &str, depth: usize) -> Option<usize> {
    for node in tree {
        if node.id == target_id {
            return Some(depth);
        }
        if let Some(found) = depth_from(&node.children, target_id, depth + 1) {
            return Some(found);
        }
    }
    None
}

/// Total number of nodes in the tree, at every level.
pub fn count(tree: &[TaskNode]) -> usize {
    tree.iter().map(|node| 1 + count(&node.children)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::mutate::tests::sample_tree;

    #[test]
    fn finds_top_level_node() {
        let tree = sample_tree();
        assert_eq!(find(&tree, "1").map(|n| n.id.as_str()), Some("1"));
    }

    #[test]
    fn finds_nested_node() {
        let tree = sample_tree();
        let node = find(&tree, "1.2.1").unwrap();
        assert_eq!(node.title, "Task 1.2.1");
    }

    #[test]
    fn missing_id_is_none() {
        let tree = sample_tree();
        assert!(find(&tree, "999").is_none());
        assert!(find(&[], "1").is_none());
    }

    #[test]
    fn duplicate_ids_return_first_in_pre_order() {
        let mut tree = sample_tree();
        // "dup" under "1" precedes the top-level "dup" in pre-order.
        let mut nested = TaskNode::new("dup", "nested").unwrap();
        nested.is_completed = true;
        tree[0].children.push(nested);
        tree.push(TaskNode::new("dup", "top").unwrap());

        assert_eq!(find(&tree, "dup").unwrap().title, "nested");
    }

    #[test]
    fn depth_counts_from_root() {
        let tree = sample_tree();
        assert_eq!(depth_of(&tree, "1"), Some(1));
        assert_eq!(depth_of(&tree, "1.2"), Some(2));
        assert_eq!(depth_of(&tree, "1.2.1"), Some(3));
        assert_eq!(depth_of(&tree, "2"), Some(1));
        assert_eq!(depth_of(&tree, "nope"), None);
    }

    #[test]
    fn count_includes_every_level() {
        assert_eq!(count(&sample_tree()), 5);
        assert_eq!(count(&[]), 0);
    }
}
