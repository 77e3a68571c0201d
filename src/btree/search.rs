//! Root-to-leaf descent, point lookup and tree measurements.

use crate::btree::{BTree, Cursor};
use crate::common::{Error, PageId, Result};
use crate::row::Row;
use crate::storage::page::NodeType;

impl BTree {
    /// Position of `key`: the leaf cell holding it, or the cell where it
    /// would be inserted.
    ///
    /// At each internal node the first separator `>= key` picks the child;
    /// keys above every separator go to the right child. Compare
    /// [`Cursor::key`] with `key` to tell a hit from an insertion point.
    pub fn find(&mut self, key: u32) -> Result<Cursor> {
        let mut page_id = self.root;
        let mut levels = 0u32;

        loop {
            let page = self.pager.page(page_id)?;
            match crate::btree::node::node_type(page, page_id)? {
                NodeType::Leaf => {
                    let cell = page.leaf().find(key);
                    return Ok(Cursor::new(page_id, cell));
                }
                NodeType::Internal => {
                    let node = page.internal();
                    let child = node.child(node.find_child_index(key));
                    page_id = self.checked_child(page_id, child, &mut levels)?;
                }
            }
        }
    }

    /// Cursor at the first row, found by following child 0 down to the
    /// leftmost leaf.
    pub fn start(&mut self) -> Result<Cursor> {
        let leaf = self.leftmost_leaf()?;
        let mut cursor = Cursor::new(leaf, 0);
        cursor.settle(self)?;
        Ok(cursor)
    }

    /// Row stored under `key`, if any.
    pub fn get(&mut self, key: u32) -> Result<Option<Row>> {
        let cursor = self.find(key)?;
        match cursor.key(self)? {
            Some(found) if found == key => cursor.row(self),
            _ => Ok(None),
        }
    }

    /// Whether a row with `key` exists.
    pub fn contains(&mut self, key: u32) -> Result<bool> {
        let cursor = self.find(key)?;
        Ok(cursor.key(self)? == Some(key))
    }

    /// Largest key in the subtree rooted at `page_id`, reached through the
    /// right child at every internal level.
    ///
    /// # Errors
    /// - `Error::Corrupted` for an empty leaf or a missing right child
    pub fn max_key(&mut self, page_id: PageId) -> Result<u32> {
        let mut current = page_id;
        let mut levels = 0u32;

        loop {
            let page = self.pager.page(current)?;
            match crate::btree::node::node_type(page, current)? {
                NodeType::Leaf => {
                    return page.leaf().max_key().ok_or_else(|| {
                        Error::corrupted(format!("{} is an empty leaf with no max key", current))
                    });
                }
                NodeType::Internal => {
                    let child = page.internal().right_child();
                    current = self.checked_child(current, child, &mut levels)?;
                }
            }
        }
    }

    /// Number of levels from the root to the leaves (1 for a lone leaf).
    pub fn depth(&mut self) -> Result<usize> {
        let mut page_id = self.root;
        let mut levels = 0u32;

        while self.node_type(page_id)? == NodeType::Internal {
            let child = self.pager.page(page_id)?.internal().child(0);
            page_id = self.checked_child(page_id, child, &mut levels)?;
        }
        Ok(levels as usize + 1)
    }

    fn leftmost_leaf(&mut self) -> Result<PageId> {
        let mut page_id = self.root;
        let mut levels = 0u32;

        while self.node_type(page_id)? == NodeType::Internal {
            let child = self.pager.page(page_id)?.internal().child(0);
            page_id = self.checked_child(page_id, child, &mut levels)?;
        }
        Ok(page_id)
    }

    /// Validate a child pointer during descent and bound the descent depth
    /// so a corrupt cycle cannot loop forever.
    fn checked_child(&self, parent: PageId, child: PageId, levels: &mut u32) -> Result<PageId> {
        if !child.is_valid() {
            return Err(Error::corrupted(format!("{} has no right child", parent)));
        }
        *levels += 1;
        if *levels > self.pager.num_pages() {
            return Err(Error::corrupted(format!(
                "descent through {} exceeds the page count",
                parent
            )));
        }
        Ok(child)
    }
}
