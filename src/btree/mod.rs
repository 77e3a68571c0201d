//! B-tree over fixed-size pages.
//!
//! # Structure
//! ```text
//!                    ┌───────────────────┐
//!        page 0 ───▶ │ root (internal)   │
//!                    │  [p3:7]  rc=p1    │
//!                    └───────────────────┘
//!                      /             \
//!        ┌────────────────┐    ┌────────────────┐
//!        │ leaf p3  1..7  │──▶ │ leaf p1  8..14 │──▶ (end)
//!        └────────────────┘    └────────────────┘
//! ```
//!
//! Each internal cell's key is the largest key in that cell's subtree;
//! keys above every cell key live under the right child. Leaves are
//! chained in key order for scans.
//!
//! # Modules
//! - [`layout`] - node byte layout and capacities
//! - [`node`] - typed views over node pages
//! - [`cursor`] - positions and row iteration
//! - `search`, `insert`, `rebuild`, `verify` - tree operations on [`BTree`]

mod cursor;
mod insert;
pub mod layout;
pub mod node;
mod rebuild;
mod search;
mod verify;

pub use cursor::{Cursor, Rows};
pub use node::{InternalNode, LeafNode};
pub use verify::TreeSummary;

use tracing::debug;

use crate::common::{Error, PageId, Result};
use crate::pager::Pager;
use crate::storage::page::NodeType;

/// A B-tree of rows keyed by `u32`, stored in the pages of one [`Pager`].
///
/// The root always lives in [`PageId::ROOT`]; when it splits, its contents
/// move to a new page and page 0 is rewritten as the new internal root.
pub struct BTree {
    pub(crate) pager: Pager,
    root: PageId,
}

impl BTree {
    /// Attach to the tree in `pager`, formatting an empty root leaf if the
    /// file has no pages yet.
    ///
    /// # Errors
    /// - `Error::Corrupted` if page 0 is not a valid root node
    pub fn open(mut pager: Pager) -> Result<Self> {
        let root = PageId::ROOT;

        if pager.num_pages() == 0 {
            let page = pager.page_mut(root)?;
            page.leaf_mut().initialize();
            page.set_root(true);
            debug!("initialized empty root leaf");
        } else {
            let page = pager.page(root)?;
            node::node_type(page, root)?;
            if !page.is_root() {
                return Err(Error::corrupted(format!("{} is not marked as root", root)));
            }
        }

        Ok(Self { pager, root })
    }

    /// Page holding the root node.
    #[inline]
    pub fn root(&self) -> PageId {
        self.root
    }

    /// The underlying page cache.
    #[inline]
    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    /// Flush every page and sync the file.
    pub fn close(&mut self) -> Result<()> {
        self.pager.close()
    }

    /// Iterate over all rows in ascending key order.
    pub fn rows(&mut self) -> Rows<'_> {
        Rows::new(self)
    }

    /// Node type of a page, validated.
    pub(crate) fn node_type(&mut self, page_id: PageId) -> Result<NodeType> {
        let page = self.pager.page(page_id)?;
        node::node_type(page, page_id)
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use crate::storage::DiskManager;
    use tempfile::TempDir;

    /// A tree over a fresh temporary file.
    pub fn create_test_tree(max_pages: u32) -> (BTree, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let dm = DiskManager::create(dir.path().join("tree.db")).unwrap();
        let pager = Pager::new(dm, max_pages).unwrap();
        (BTree::open(pager).unwrap(), dir)
    }

    pub fn row(id: u32) -> crate::Row {
        crate::Row::new(id, format!("user{}", id), format!("user{}@example.com", id)).unwrap()
    }

    pub fn keys(tree: &mut BTree) -> Vec<u32> {
        tree.rows().map(|r| r.unwrap().id()).collect()
    }
}
