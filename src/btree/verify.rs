//! Structural consistency check.
//!
//! [`BTree::verify`] walks every node from the root and checks:
//! - node type tags and cell counts are valid
//! - only page 0 carries the root flag
//! - every child points back at its parent
//! - keys are strictly ascending within a node and stay inside the range
//!   their ancestors allow
//! - each internal cell key equals the max key of its child subtree
//! - every internal node has a right child
//! - all leaves sit at the same depth
//! - the leaf chain visits exactly the leaves, in key order

use std::collections::HashSet;
use std::fmt;

use crate::btree::BTree;
use crate::common::{Error, PageId, Result};
use crate::storage::page::NodeType;

/// Shape of a tree that passed [`BTree::verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeSummary {
    /// Levels from root to leaves, 1 for a lone root leaf.
    pub depth: usize,
    pub leaves: usize,
    pub internal_nodes: usize,
    pub rows: usize,
}

impl fmt::Display for TreeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "depth={} leaves={} internal={} rows={}",
            self.depth, self.leaves, self.internal_nodes, self.rows
        )
    }
}

/// Key range a subtree must respect: `lower < key <= upper`.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    lower: Option<u32>,
    upper: Option<u32>,
}

impl Bounds {
    const ALL: Bounds = Bounds {
        lower: None,
        upper: None,
    };

    fn contains(&self, key: u32) -> bool {
        self.lower.is_none_or(|low| key > low) && self.upper.is_none_or(|high| key <= high)
    }
}

#[derive(Default)]
struct Walk {
    visited: HashSet<PageId>,
    leaves: Vec<PageId>,
    leaf_depth: Option<usize>,
    summary: TreeSummary,
}

impl BTree {
    /// Check every structural invariant of the tree.
    ///
    /// # Errors
    /// - `Error::Corrupted` describing the first violation found
    pub fn verify(&mut self) -> Result<TreeSummary> {
        let mut walk = Walk::default();
        self.verify_node(self.root, None, Bounds::ALL, 1, &mut walk)?;
        self.verify_leaf_chain(&walk.leaves)?;

        walk.summary.depth = walk.leaf_depth.unwrap_or(1);
        Ok(walk.summary)
    }

    /// Verify the subtree at `page_id` and return its max key, `None` only
    /// for an empty root leaf.
    fn verify_node(
        &mut self,
        page_id: PageId,
        parent: Option<PageId>,
        bounds: Bounds,
        depth: usize,
        walk: &mut Walk,
    ) -> Result<Option<u32>> {
        if !walk.visited.insert(page_id) {
            return Err(Error::corrupted(format!("{} is reachable twice", page_id)));
        }

        let page = self.pager.page(page_id)?;
        let node_type = crate::btree::node::node_type(page, page_id)?;

        match parent {
            None if !page.is_root() => {
                return Err(Error::corrupted(format!("{} is not marked as root", page_id)));
            }
            Some(_) if page.is_root() => {
                return Err(Error::corrupted(format!(
                    "{} is marked as root but is not the root",
                    page_id
                )));
            }
            Some(parent) if page.parent() != parent => {
                return Err(Error::corrupted(format!(
                    "{} has parent {}, expected {}",
                    page_id,
                    page.parent(),
                    parent
                )));
            }
            _ => {}
        }

        match node_type {
            NodeType::Leaf => {
                let leaf = page.leaf();
                let keys: Vec<u32> = (0..leaf.num_cells()).map(|i| leaf.key(i)).collect();
                check_keys(page_id, &keys, bounds)?;

                if keys.is_empty() && parent.is_some() {
                    return Err(Error::corrupted(format!(
                        "{} is an empty non-root leaf",
                        page_id
                    )));
                }
                match walk.leaf_depth {
                    None => walk.leaf_depth = Some(depth),
                    Some(expected) if expected != depth => {
                        return Err(Error::corrupted(format!(
                            "{} is a leaf at depth {}, other leaves are at depth {}",
                            page_id, depth, expected
                        )));
                    }
                    Some(_) => {}
                }

                walk.leaves.push(page_id);
                walk.summary.leaves += 1;
                walk.summary.rows += keys.len();
                Ok(keys.last().copied())
            }
            NodeType::Internal => {
                let node = page.internal();
                let keys: Vec<u32> = (0..node.num_keys()).map(|i| node.key(i)).collect();
                let children = node.children();
                check_keys(page_id, &keys, bounds)?;

                if keys.is_empty() {
                    return Err(Error::corrupted(format!(
                        "{} is an internal node with no keys",
                        page_id
                    )));
                }
                if !node.right_child().is_valid() {
                    return Err(Error::corrupted(format!("{} has no right child", page_id)));
                }
                walk.summary.internal_nodes += 1;

                let mut lower = bounds.lower;
                let mut max = None;
                for (i, &child) in children.iter().enumerate() {
                    let upper = keys.get(i).copied().or(bounds.upper);
                    let child_bounds = Bounds { lower, upper };
                    let child_max =
                        self.verify_node(child, Some(page_id), child_bounds, depth + 1, walk)?;

                    if let Some(&separator) = keys.get(i) {
                        if child_max != Some(separator) {
                            return Err(Error::corrupted(format!(
                                "{} separator {} does not match max key {:?} of {}",
                                page_id, separator, child_max, child
                            )));
                        }
                    }
                    lower = upper;
                    max = child_max;
                }
                Ok(max)
            }
        }
    }

    /// Follow next-leaf pointers from the first leaf and compare against the
    /// leaves found by descending.
    fn verify_leaf_chain(&mut self, leaves: &[PageId]) -> Result<()> {
        let Some(&first) = leaves.first() else {
            return Ok(());
        };

        let mut current = Some(first);
        for (position, &expected) in leaves.iter().enumerate() {
            match current {
                Some(page_id) if page_id == expected => {
                    current = self.pager.page(page_id)?.leaf().next_leaf();
                }
                other => {
                    return Err(Error::corrupted(format!(
                        "leaf chain reaches {:?} at position {}, expected {}",
                        other, position, expected
                    )));
                }
            }
        }

        if let Some(extra) = current {
            return Err(Error::corrupted(format!(
                "leaf chain continues to {} past the last leaf",
                extra
            )));
        }
        Ok(())
    }
}

fn check_keys(page_id: PageId, keys: &[u32], bounds: Bounds) -> Result<()> {
    if let Some(pair) = keys.windows(2).find(|pair| pair[0] >= pair[1]) {
        return Err(Error::corrupted(format!(
            "{} keys out of order: {} then {}",
            page_id, pair[0], pair[1]
        )));
    }
    if let Some(&key) = keys.iter().find(|&&key| !bounds.contains(key)) {
        return Err(Error::corrupted(format!(
            "{} key {} outside range ({:?}, {:?}]",
            page_id, key, bounds.lower, bounds.upper
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::btree::layout::LEAF_NODE_MAX_CELLS;
    use crate::btree::test_util::*;
    use crate::{Error, PageId};

    #[test]
    fn test_verify_empty_tree() {
        let (mut tree, _dir) = create_test_tree(16);
        let summary = tree.verify().unwrap();

        assert_eq!(summary.depth, 1);
        assert_eq!(summary.leaves, 1);
        assert_eq!(summary.internal_nodes, 0);
        assert_eq!(summary.rows, 0);
    }

    #[test]
    fn test_verify_after_split() {
        let (mut tree, _dir) = create_test_tree(16);
        for id in 1..=(LEAF_NODE_MAX_CELLS as u32 + 1) {
            tree.insert(&row(id)).unwrap();
        }

        let summary = tree.verify().unwrap();
        assert_eq!(summary.depth, 2);
        assert_eq!(summary.leaves, 2);
        assert_eq!(summary.internal_nodes, 1);
        assert_eq!(summary.rows, LEAF_NODE_MAX_CELLS + 1);
    }

    #[test]
    fn test_verify_large_tree() {
        let (mut tree, _dir) = create_test_tree(512);
        for id in (1..=300).rev() {
            tree.insert(&row(id * 3)).unwrap();
        }

        let summary = tree.verify().unwrap();
        assert_eq!(summary.rows, 300);
        assert_eq!(summary.depth, tree.depth().unwrap());
        assert_eq!(
            summary.leaves + summary.internal_nodes,
            tree.pager().num_pages() as usize
        );
    }

    #[test]
    fn test_verify_detects_wrong_separator() {
        let (mut tree, _dir) = create_test_tree(16);
        for id in 1..=20 {
            tree.insert(&row(id)).unwrap();
        }

        tree.pager
            .page_mut(PageId::ROOT)
            .unwrap()
            .internal_mut()
            .set_key(0, 3);
        assert!(matches!(tree.verify(), Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_verify_detects_bad_parent() {
        let (mut tree, _dir) = create_test_tree(16);
        for id in 1..=20 {
            tree.insert(&row(id)).unwrap();
        }

        let child = tree.pager.page(PageId::ROOT).unwrap().internal().child(0);
        tree.pager.page_mut(child).unwrap().set_parent(PageId::new(9));
        assert!(matches!(tree.verify(), Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_verify_detects_broken_leaf_chain() {
        let (mut tree, _dir) = create_test_tree(16);
        for id in 1..=20 {
            tree.insert(&row(id)).unwrap();
        }

        let first = tree.start().unwrap().page();
        tree.pager.page_mut(first).unwrap().leaf_mut().set_next_leaf(None);
        assert!(matches!(tree.verify(), Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_verify_detects_cycle() {
        let (mut tree, _dir) = create_test_tree(16);
        for id in 1..=20 {
            tree.insert(&row(id)).unwrap();
        }

        let left = tree.pager.page(PageId::ROOT).unwrap().internal().child(0);
        tree.pager
            .page_mut(PageId::ROOT)
            .unwrap()
            .internal_mut()
            .set_right_child(left);
        assert!(matches!(tree.verify(), Err(Error::Corrupted(_))));
    }
}
