//! Insertion with leaf splits, internal splits and root promotion.
//!
//! ```text
//!  insert ──▶ leaf has room? ──yes──▶ shift + write cell
//!                   │no
//!                   ▼
//!             split leaf ──root?──yes──▶ promote root
//!                   │no
//!                   ▼
//!      fix parent separator, insert sibling into parent
//!                   │
//!                   ▼
//!           parent has room? ──yes──▶ insert cell
//!                   │no
//!                   ▼
//!        split internal ──root?──yes──▶ promote root
//!                   │no
//!                   └──▶ fix grandparent separator, recurse upward
//! ```

use tracing::debug;

use crate::btree::layout::*;
use crate::btree::{BTree, Cursor};
use crate::common::{Error, PageId, Result};
use crate::row::Row;
use crate::storage::page::{NodeType, Page};

impl BTree {
    /// Insert a row keyed by `row.id()`.
    ///
    /// # Errors
    /// - `Error::DuplicateKey` if the key exists (nothing is modified)
    /// - `Error::TableFull` if a split could run out of pages (nothing is
    ///   modified)
    /// - I/O or capacity errors once a split is under way; the split is not
    ///   rolled back
    pub fn insert(&mut self, row: &Row) -> Result<()> {
        let key = row.id();
        let cursor = self.find(key)?;

        let num_cells = {
            let leaf = self.pager.page(cursor.page())?.leaf();
            let num_cells = leaf.num_cells();
            if cursor.cell() < num_cells && leaf.key(cursor.cell()) == key {
                return Err(Error::DuplicateKey(key));
            }
            num_cells
        };

        if num_cells < LEAF_NODE_MAX_CELLS {
            self.pager
                .page_mut(cursor.page())?
                .leaf_mut()
                .insert(cursor.cell(), row);
            return Ok(());
        }

        self.ensure_split_capacity()?;
        self.leaf_split_and_insert(cursor, row)
    }

    /// A split allocates at most one page per level plus one for the new
    /// root. Refuse up front rather than fail halfway.
    fn ensure_split_capacity(&mut self) -> Result<()> {
        let needed = self.depth()? as u32 + 1;
        let available = self.pager.free_pages();
        if needed > available {
            return Err(Error::TableFull { needed, available });
        }
        Ok(())
    }

    /// Split a full leaf into itself and a new right sibling, placing the
    /// new row in order, then hook the sibling into the tree.
    fn leaf_split_and_insert(&mut self, cursor: Cursor, row: &Row) -> Result<()> {
        let old_id = cursor.page();

        let (old_max, parent, next, was_root, cells) = {
            let page = self.pager.page(old_id)?;
            let leaf = page.leaf();
            let num_cells = leaf.num_cells();

            let mut cells = Vec::with_capacity((num_cells + 1) * LEAF_NODE_CELL_SIZE);
            for i in 0..num_cells {
                if i == cursor.cell() {
                    cells.extend_from_slice(&encode_cell(row));
                }
                cells.extend_from_slice(leaf.cell(i));
            }
            if cursor.cell() == num_cells {
                cells.extend_from_slice(&encode_cell(row));
            }

            let old_max = leaf.max_key().unwrap_or(row.id());
            (old_max, page.parent(), leaf.next_leaf(), page.is_root(), cells)
        };

        let new_id = self.pager.allocate_page()?;
        {
            let page = self.pager.page_mut(new_id)?;
            page.leaf_mut().initialize();
            page.set_parent(parent);

            let mut leaf = page.leaf_mut();
            leaf.set_next_leaf(next);
            for (i, cell) in cells
                .chunks_exact(LEAF_NODE_CELL_SIZE)
                .skip(LEAF_NODE_LEFT_SPLIT_COUNT)
                .enumerate()
            {
                leaf.set_cell(i, cell);
            }
            leaf.set_num_cells(LEAF_NODE_RIGHT_SPLIT_COUNT);
        }
        {
            let mut leaf = self.pager.page_mut(old_id)?.leaf_mut();
            for (i, cell) in cells
                .chunks_exact(LEAF_NODE_CELL_SIZE)
                .take(LEAF_NODE_LEFT_SPLIT_COUNT)
                .enumerate()
            {
                leaf.set_cell(i, cell);
            }
            leaf.set_num_cells(LEAF_NODE_LEFT_SPLIT_COUNT);
            leaf.set_next_leaf(Some(new_id));
        }

        debug!(left = old_id.0, right = new_id.0, key = row.id(), "split leaf");

        if was_root {
            return self.create_new_root(new_id);
        }

        let new_max = self.max_key(old_id)?;
        self.update_separator(parent, old_max, new_max)?;
        self.internal_node_insert(parent, new_id)
    }

    /// Replace the separator that covered `old_key` with `new_key`.
    ///
    /// If `old_key` falls under the right child there is no separator to
    /// fix and nothing changes.
    fn update_separator(&mut self, parent: PageId, old_key: u32, new_key: u32) -> Result<()> {
        let mut node = self.pager.page_mut(parent)?.internal_mut();
        let index = node.find_child_index(old_key);
        if index < node.num_keys() {
            node.set_key(index, new_key);
        }
        Ok(())
    }

    /// Add `child_id` to internal node `parent_id`, splitting it when full.
    fn internal_node_insert(&mut self, parent_id: PageId, child_id: PageId) -> Result<()> {
        let (num_keys, right_child) = {
            let node = self.pager.page(parent_id)?.internal();
            (node.num_keys(), node.right_child())
        };

        if num_keys >= INTERNAL_NODE_MAX_CELLS {
            return self.internal_node_split_and_insert(parent_id, child_id);
        }

        if !right_child.is_valid() {
            self.pager
                .page_mut(parent_id)?
                .internal_mut()
                .set_right_child(child_id);
            self.pager.page_mut(child_id)?.set_parent(parent_id);
            return Ok(());
        }

        let child_max = self.max_key(child_id)?;
        let right_max = self.max_key(right_child)?;

        let mut node = self.pager.page_mut(parent_id)?.internal_mut();
        if child_max > right_max {
            // The old right child becomes an ordinary cell.
            node.insert_cell(num_keys, right_child, right_max);
            node.set_right_child(child_id);
        } else {
            let index = node.find_child_index(child_max);
            node.insert_cell(index, child_id, child_max);
        }

        self.pager.page_mut(child_id)?.set_parent(parent_id);
        Ok(())
    }

    /// Split a full internal node while adding `child_id` to it.
    ///
    /// All children, the new one included, are ordered by their max key and
    /// divided between the original page (lower half) and a new sibling
    /// (upper half). Each half's last child becomes its right child.
    fn internal_node_split_and_insert(&mut self, old_id: PageId, child_id: PageId) -> Result<()> {
        let (was_root, parent, mut entries, right_child) = {
            let page = self.pager.page(old_id)?;
            let node = page.internal();
            let entries: Vec<(PageId, u32)> = (0..node.num_keys())
                .map(|i| (node.child(i), node.key(i)))
                .collect();
            (page.is_root(), page.parent(), entries, node.right_child())
        };

        let right_max = self.max_key(right_child)?;
        entries.push((right_child, right_max));

        let child_max = self.max_key(child_id)?;
        let position = entries.partition_point(|&(_, key)| key < child_max);
        entries.insert(position, (child_id, child_max));

        // Max of the whole subtree, which is what the grandparent's separator
        // for this node holds.
        let old_max = entries.last().map_or(child_max, |&(_, key)| key);

        let (left, right) = entries.split_at(entries.len().div_ceil(2));
        let new_id = self.pager.allocate_page()?;

        self.write_internal(old_id, left)?;
        {
            let page = self.pager.page_mut(new_id)?;
            write_internal_cells(page, right);
            page.set_root(false);
            page.set_parent(parent);
        }
        for &(child, _) in left {
            self.pager.page_mut(child)?.set_parent(old_id);
        }
        for &(child, _) in right {
            self.pager.page_mut(child)?.set_parent(new_id);
        }

        debug!(
            left = old_id.0,
            right = new_id.0,
            left_children = left.len(),
            right_children = right.len(),
            "split internal node"
        );

        if was_root {
            return self.create_new_root(new_id);
        }

        let new_max = left.last().map_or(old_max, |&(_, key)| key);
        self.update_separator(parent, old_max, new_max)?;
        self.internal_node_insert(parent, new_id)
    }

    /// Rewrite an internal node with `entries`, keeping its root flag and
    /// parent pointer.
    fn write_internal(&mut self, page_id: PageId, entries: &[(PageId, u32)]) -> Result<()> {
        let page = self.pager.page_mut(page_id)?;
        let is_root = page.is_root();
        let parent = page.parent();

        write_internal_cells(page, entries);
        page.set_root(is_root);
        page.set_parent(parent);
        Ok(())
    }

    /// Promote a new root after the root split off `right_id`.
    ///
    /// The old root's contents move to a fresh left page, and page 0 becomes
    /// an internal node with one separator (the left child's max) and
    /// `right_id` as its right child.
    fn create_new_root(&mut self, right_id: PageId) -> Result<()> {
        let root_id = self.root;
        let left_id = self.pager.allocate_page()?;

        let mut snapshot = Box::new(Page::new());
        snapshot.copy_from(self.pager.page(root_id)?);

        {
            let left = self.pager.page_mut(left_id)?;
            left.copy_from(&snapshot);
            left.set_root(false);
            left.set_parent(root_id);
        }

        if crate::btree::node::node_type(&snapshot, root_id)? == NodeType::Internal {
            for child in snapshot.internal().children() {
                self.pager.page_mut(child)?.set_parent(left_id);
            }
        }

        let left_max = self.max_key(left_id)?;

        {
            let root = self.pager.page_mut(root_id)?;
            root.internal_mut().initialize();
            root.set_root(true);

            let mut node = root.internal_mut();
            node.set_cell(0, left_id, left_max);
            node.set_num_keys(1);
            node.set_right_child(right_id);
        }
        self.pager.page_mut(right_id)?.set_parent(root_id);

        debug!(
            left = left_id.0,
            right = right_id.0,
            separator = left_max,
            "promoted new root"
        );
        Ok(())
    }
}

/// Serialize a row as a leaf cell.
fn encode_cell(row: &Row) -> [u8; LEAF_NODE_CELL_SIZE] {
    let mut cell = [0u8; LEAF_NODE_CELL_SIZE];
    cell[LEAF_NODE_KEY_OFFSET..LEAF_NODE_KEY_OFFSET + LEAF_NODE_KEY_SIZE]
        .copy_from_slice(&row.id().to_le_bytes());
    row.serialize(&mut cell[LEAF_NODE_VALUE_OFFSET..]);
    cell
}

/// Format `page` as an internal node holding `entries`, the last of which
/// becomes the right child.
fn write_internal_cells(page: &mut Page, entries: &[(PageId, u32)]) {
    let mut node = page.internal_mut();
    node.initialize();

    if let Some((&(last, _), cells)) = entries.split_last() {
        for (i, &(child, key)) in cells.iter().enumerate() {
            node.set_cell(i, child, key);
        }
        node.set_num_keys(cells.len());
        node.set_right_child(last);
    }
}
