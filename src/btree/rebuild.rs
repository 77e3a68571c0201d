//! Copying a tree's rows into another tree.
//!
//! Deletion rebuilds the table without the removed row, so the walk here
//! must reach every leaf even if the leaf chain is damaged. It descends
//! from the root instead of following next-leaf pointers.

use std::collections::HashSet;

use tracing::trace;

use crate::btree::BTree;
use crate::common::{Error, PageId, Result};
use crate::storage::page::NodeType;

impl BTree {
    /// Insert every row of this tree except the one keyed `skip` into `dst`.
    ///
    /// Leaves are visited left to right, so `dst` receives rows in
    /// ascending order. Returns the number of rows copied.
    ///
    /// # Errors
    /// - `Error::Corrupted` if a page is reachable twice
    /// - any error from [`BTree::insert`] on `dst`
    pub fn copy_rows_except(&mut self, skip: u32, dst: &mut BTree) -> Result<usize> {
        let mut stack = vec![self.root];
        let mut visited = HashSet::new();
        let mut copied = 0;

        while let Some(page_id) = stack.pop() {
            if !visited.insert(page_id) {
                return Err(Error::corrupted(format!("{} is reachable twice", page_id)));
            }

            match self.node_type(page_id)? {
                NodeType::Internal => {
                    let children = self.pager.page(page_id)?.internal().children();
                    push_children(&mut stack, page_id, &children)?;
                }
                NodeType::Leaf => {
                    let rows = {
                        let leaf = self.pager.page(page_id)?.leaf();
                        (0..leaf.num_cells())
                            .filter(|&i| leaf.key(i) != skip)
                            .map(|i| leaf.row(i))
                            .collect::<Result<Vec<_>>>()?
                    };
                    for row in &rows {
                        dst.insert(row)?;
                    }
                    trace!(page = page_id.0, rows = rows.len(), "copied leaf");
                    copied += rows.len();
                }
            }
        }

        Ok(copied)
    }
}

/// Push children so the leftmost is popped first.
fn push_children(stack: &mut Vec<PageId>, parent: PageId, children: &[PageId]) -> Result<()> {
    for &child in children.iter().rev() {
        if !child.is_valid() {
            return Err(Error::corrupted(format!("{} has no right child", parent)));
        }
        stack.push(child);
    }
    Ok(())
}
