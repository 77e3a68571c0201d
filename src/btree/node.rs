//! Typed views over node pages.
//!
//! [`LeafNode`] and [`InternalNode`] wrap a byte buffer and compute field
//! offsets from [`layout`](super::layout). Read accessors need
//! `B: AsRef<[u8]>`, mutators additionally need `B: AsMut<[u8]>`, so a view
//! over `&[u8]` is read-only and a view over `&mut [u8]` is the only handle
//! to the page while it lives.

use crate::btree::layout::*;
use crate::common::{Error, PageId, Result};
use crate::row::Row;
use crate::storage::page::{NodeHeader, NodeType, Page};

#[inline]
fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

#[inline]
fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Node type of a page, rejecting unknown tags and impossible cell counts.
///
/// Every page visited by the tree goes through this check, which keeps the
/// indexed accessors below inside the page.
pub fn node_type(page: &Page, page_id: PageId) -> Result<NodeType> {
    let node_type = page.node_type().ok_or_else(|| {
        Error::corrupted(format!(
            "{} has unknown node type {}",
            page_id,
            page.as_slice()[NodeHeader::OFFSET_NODE_TYPE]
        ))
    })?;

    let (count, max) = match node_type {
        NodeType::Leaf => (page.leaf().num_cells(), LEAF_NODE_MAX_CELLS),
        NodeType::Internal => (page.internal().num_keys(), INTERNAL_NODE_MAX_CELLS),
    };
    if count > max {
        return Err(Error::corrupted(format!(
            "{} holds {} cells, capacity is {}",
            page_id, count, max
        )));
    }
    Ok(node_type)
}

impl Page {
    /// Read-only leaf view.
    #[inline]
    pub fn leaf(&self) -> LeafNode<&[u8]> {
        LeafNode::new(self.as_slice())
    }

    /// Mutable leaf view.
    #[inline]
    pub fn leaf_mut(&mut self) -> LeafNode<&mut [u8]> {
        LeafNode::new(self.as_mut_slice())
    }

    /// Read-only internal view.
    #[inline]
    pub fn internal(&self) -> InternalNode<&[u8]> {
        InternalNode::new(self.as_slice())
    }

    /// Mutable internal view.
    #[inline]
    pub fn internal_mut(&mut self) -> InternalNode<&mut [u8]> {
        InternalNode::new(self.as_mut_slice())
    }
}

// ============================================================================
// LEAF NODES
// ============================================================================

/// A leaf node: sorted `(key, row)` cells plus a next-leaf pointer.
pub struct LeafNode<B> {
    buf: B,
}

impl<B: AsRef<[u8]>> LeafNode<B> {
    #[inline]
    pub fn new(buf: B) -> Self {
        Self { buf }
    }

    #[inline]
    fn bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    #[inline]
    fn cell_offset(index: usize) -> usize {
        debug_assert!(index < LEAF_NODE_MAX_CELLS);
        LEAF_NODE_HEADER_SIZE + index * LEAF_NODE_CELL_SIZE
    }

    pub fn num_cells(&self) -> usize {
        read_u32(self.bytes(), LEAF_NODE_NUM_CELLS_OFFSET) as usize
    }

    /// Following leaf in key order, `None` for the last leaf.
    pub fn next_leaf(&self) -> Option<PageId> {
        match read_u32(self.bytes(), LEAF_NODE_NEXT_LEAF_OFFSET) {
            NO_NEXT_LEAF => None,
            page => Some(PageId::new(page)),
        }
    }

    pub fn key(&self, index: usize) -> u32 {
        read_u32(self.bytes(), Self::cell_offset(index) + LEAF_NODE_KEY_OFFSET)
    }

    /// Raw cell bytes (key followed by the serialized row).
    pub fn cell(&self, index: usize) -> &[u8] {
        let offset = Self::cell_offset(index);
        &self.bytes()[offset..offset + LEAF_NODE_CELL_SIZE]
    }

    /// Serialized row bytes of a cell.
    pub fn value(&self, index: usize) -> &[u8] {
        let offset = Self::cell_offset(index) + LEAF_NODE_VALUE_OFFSET;
        &self.bytes()[offset..offset + LEAF_NODE_VALUE_SIZE]
    }

    pub fn row(&self, index: usize) -> Result<Row> {
        Row::deserialize(self.value(index))
    }

    /// Largest key in this leaf, `None` if empty.
    pub fn max_key(&self) -> Option<u32> {
        self.num_cells().checked_sub(1).map(|last| self.key(last))
    }

    /// Binary search for the first cell whose key is `>= key`.
    ///
    /// Returns `num_cells()` when every key is smaller.
    pub fn find(&self, key: u32) -> usize {
        let mut low = 0;
        let mut high = self.num_cells();

        while low < high {
            let mid = low + (high - low) / 2;
            let key_at_mid = self.key(mid);
            if key_at_mid == key {
                return mid;
            }
            if key < key_at_mid {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        low
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> LeafNode<B> {
    #[inline]
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    /// Format the page as an empty, non-root leaf with no successor.
    pub fn initialize(&mut self) {
        NodeHeader::new(NodeType::Leaf).write_to(self.bytes_mut());
        self.set_num_cells(0);
        self.set_next_leaf(None);
    }

    pub fn set_num_cells(&mut self, num_cells: usize) {
        write_u32(self.bytes_mut(), LEAF_NODE_NUM_CELLS_OFFSET, num_cells as u32);
    }

    pub fn set_next_leaf(&mut self, next: Option<PageId>) {
        let raw = next.map_or(NO_NEXT_LEAF, |page| page.0);
        write_u32(self.bytes_mut(), LEAF_NODE_NEXT_LEAF_OFFSET, raw);
    }

    /// Overwrite a cell with raw bytes from [`LeafNode::cell`].
    pub fn set_cell(&mut self, index: usize, cell: &[u8]) {
        let offset = Self::cell_offset(index);
        self.bytes_mut()[offset..offset + LEAF_NODE_CELL_SIZE].copy_from_slice(cell);
    }

    /// Write `(row.id(), row)` into a cell.
    pub fn write_row(&mut self, index: usize, row: &Row) {
        let offset = Self::cell_offset(index);
        write_u32(self.bytes_mut(), offset + LEAF_NODE_KEY_OFFSET, row.id());
        let value = offset + LEAF_NODE_VALUE_OFFSET;
        row.serialize(&mut self.bytes_mut()[value..value + LEAF_NODE_VALUE_SIZE]);
    }

    /// Insert a row at `index`, shifting later cells one slot right.
    ///
    /// # Panics
    /// Panics if the leaf is full or `index > num_cells()`.
    pub fn insert(&mut self, index: usize, row: &Row) {
        let num_cells = self.num_cells();
        assert!(num_cells < LEAF_NODE_MAX_CELLS, "leaf is full");
        assert!(index <= num_cells, "insert position out of range");

        if index < num_cells {
            let start = Self::cell_offset(index);
            let end = LEAF_NODE_HEADER_SIZE + num_cells * LEAF_NODE_CELL_SIZE;
            self.bytes_mut()
                .copy_within(start..end, start + LEAF_NODE_CELL_SIZE);
        }

        self.write_row(index, row);
        self.set_num_cells(num_cells + 1);
    }
}

// ============================================================================
// INTERNAL NODES
// ============================================================================

/// An internal node: sorted `(child, key)` cells plus a right child.
///
/// A node with N keys has N + 1 children; child N is the right child.
pub struct InternalNode<B> {
    buf: B,
}

impl<B: AsRef<[u8]>> InternalNode<B> {
    #[inline]
    pub fn new(buf: B) -> Self {
        Self { buf }
    }

    #[inline]
    fn bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    #[inline]
    fn cell_offset(index: usize) -> usize {
        debug_assert!(index < INTERNAL_NODE_MAX_CELLS);
        INTERNAL_NODE_HEADER_SIZE + index * INTERNAL_NODE_CELL_SIZE
    }

    pub fn num_keys(&self) -> usize {
        read_u32(self.bytes(), INTERNAL_NODE_NUM_KEYS_OFFSET) as usize
    }

    /// Right child, [`PageId::INVALID`] if not yet set.
    pub fn right_child(&self) -> PageId {
        PageId::new(read_u32(self.bytes(), INTERNAL_NODE_RIGHT_CHILD_OFFSET))
    }

    /// Child `index`, where `index == num_keys()` names the right child.
    pub fn child(&self, index: usize) -> PageId {
        if index == self.num_keys() {
            self.right_child()
        } else {
            PageId::new(read_u32(self.bytes(), Self::cell_offset(index)))
        }
    }

    pub fn key(&self, index: usize) -> u32 {
        read_u32(self.bytes(), Self::cell_offset(index) + INTERNAL_NODE_CHILD_SIZE)
    }

    /// All children in key order, right child last.
    pub fn children(&self) -> Vec<PageId> {
        (0..=self.num_keys()).map(|i| self.child(i)).collect()
    }

    /// Index of the child whose subtree covers `key`: the first cell whose
    /// key is `>= key`, or `num_keys()` (the right child) if none is.
    pub fn find_child_index(&self, key: u32) -> usize {
        let mut low = 0;
        let mut high = self.num_keys();

        while low < high {
            let mid = low + (high - low) / 2;
            if self.key(mid) >= key {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        low
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> InternalNode<B> {
    #[inline]
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    /// Format the page as an empty, non-root internal node with no right
    /// child.
    pub fn initialize(&mut self) {
        NodeHeader::new(NodeType::Internal).write_to(self.bytes_mut());
        self.set_num_keys(0);
        self.set_right_child(PageId::INVALID);
    }

    pub fn set_num_keys(&mut self, num_keys: usize) {
        write_u32(self.bytes_mut(), INTERNAL_NODE_NUM_KEYS_OFFSET, num_keys as u32);
    }

    pub fn set_right_child(&mut self, child: PageId) {
        write_u32(self.bytes_mut(), INTERNAL_NODE_RIGHT_CHILD_OFFSET, child.0);
    }

    /// Set the child pointer of cell `index` (not the right child).
    pub fn set_cell_child(&mut self, index: usize, child: PageId) {
        write_u32(self.bytes_mut(), Self::cell_offset(index), child.0);
    }

    pub fn set_key(&mut self, index: usize, key: u32) {
        write_u32(
            self.bytes_mut(),
            Self::cell_offset(index) + INTERNAL_NODE_CHILD_SIZE,
            key,
        );
    }

    /// Write a whole cell.
    pub fn set_cell(&mut self, index: usize, child: PageId, key: u32) {
        self.set_cell_child(index, child);
        self.set_key(index, key);
    }

    /// Insert a cell at `index`, shifting later cells one slot right.
    ///
    /// # Panics
    /// Panics if the node is full or `index > num_keys()`.
    pub fn insert_cell(&mut self, index: usize, child: PageId, key: u32) {
        let num_keys = self.num_keys();
        assert!(num_keys < INTERNAL_NODE_MAX_CELLS, "internal node is full");
        assert!(index <= num_keys, "insert position out of range");

        if index < num_keys {
            let start = Self::cell_offset(index);
            let end = INTERNAL_NODE_HEADER_SIZE + num_keys * INTERNAL_NODE_CELL_SIZE;
            self.bytes_mut()
                .copy_within(start..end, start + INTERNAL_NODE_CELL_SIZE);
        }

        self.set_cell(index, child, key);
        self.set_num_keys(num_keys + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: u32) -> Row {
        Row::new(id, format!("user{}", id), format!("user{}@example.com", id)).unwrap()
    }

    fn leaf_with(keys: &[u32]) -> Page {
        let mut page = Page::new();
        let mut leaf = page.leaf_mut();
        leaf.initialize();
        for (i, &k) in keys.iter().enumerate() {
            leaf.insert(i, &row(k));
        }
        page
    }

    #[test]
    fn test_leaf_initialize() {
        let page = leaf_with(&[]);
        assert_eq!(page.node_type(), Some(NodeType::Leaf));
        assert!(!page.is_root());
        assert_eq!(page.leaf().num_cells(), 0);
        assert_eq!(page.leaf().next_leaf(), None);
        assert_eq!(page.leaf().max_key(), None);
    }

    #[test]
    fn test_leaf_insert_shifts_cells() {
        let mut page = leaf_with(&[10, 30]);
        page.leaf_mut().insert(1, &row(20));
        page.leaf_mut().insert(0, &row(5));

        let leaf = page.leaf();
        let keys: Vec<u32> = (0..leaf.num_cells()).map(|i| leaf.key(i)).collect();
        assert_eq!(keys, vec![5, 10, 20, 30]);
        assert_eq!(leaf.row(2).unwrap(), row(20));
        assert_eq!(leaf.row(3).unwrap(), row(30));
        assert_eq!(leaf.max_key(), Some(30));
    }

    #[test]
    fn test_leaf_find() {
        let page = leaf_with(&[10, 20, 30]);
        let leaf = page.leaf();

        assert_eq!(leaf.find(5), 0);
        assert_eq!(leaf.find(10), 0);
        assert_eq!(leaf.find(15), 1);
        assert_eq!(leaf.find(30), 2);
        assert_eq!(leaf.find(31), 3);
    }

    #[test]
    fn test_leaf_next_pointer() {
        let mut page = leaf_with(&[]);
        page.leaf_mut().set_next_leaf(Some(PageId::new(7)));
        assert_eq!(page.leaf().next_leaf(), Some(PageId::new(7)));
        page.leaf_mut().set_next_leaf(None);
        assert_eq!(page.leaf().next_leaf(), None);
    }

    #[test]
    fn test_leaf_cell_copy() {
        let src = leaf_with(&[1, 2]);
        let mut dst = leaf_with(&[]);
        dst.leaf_mut().set_cell(0, src.leaf().cell(1));
        dst.leaf_mut().set_num_cells(1);
        assert_eq!(dst.leaf().row(0).unwrap(), row(2));
    }

    #[test]
    #[should_panic(expected = "leaf is full")]
    fn test_leaf_insert_into_full_leaf_panics() {
        let keys: Vec<u32> = (0..LEAF_NODE_MAX_CELLS as u32).collect();
        let mut page = leaf_with(&keys);
        page.leaf_mut().insert(0, &row(100));
    }

    #[test]
    fn test_internal_initialize() {
        let mut page = Page::new();
        page.internal_mut().initialize();

        let node = page.internal();
        assert_eq!(page.node_type(), Some(NodeType::Internal));
        assert_eq!(node.num_keys(), 0);
        assert!(!node.right_child().is_valid());
    }

    #[test]
    fn test_internal_cells_and_children() {
        let mut page = Page::new();
        let mut node = page.internal_mut();
        node.initialize();
        node.insert_cell(0, PageId::new(3), 30);
        node.insert_cell(0, PageId::new(1), 10);
        node.insert_cell(1, PageId::new(2), 20);
        node.set_right_child(PageId::new(4));

        let node = page.internal();
        assert_eq!(node.num_keys(), 3);
        assert_eq!(node.key(1), 20);
        assert_eq!(node.child(3), PageId::new(4));
        assert_eq!(
            node.children(),
            vec![PageId::new(1), PageId::new(2), PageId::new(3), PageId::new(4)]
        );
    }

    #[test]
    fn test_internal_find_child_index() {
        let mut page = Page::new();
        let mut node = page.internal_mut();
        node.initialize();
        node.insert_cell(0, PageId::new(1), 10);
        node.insert_cell(1, PageId::new(2), 20);
        node.set_right_child(PageId::new(3));

        let node = page.internal();
        assert_eq!(node.find_child_index(1), 0);
        assert_eq!(node.find_child_index(10), 0);
        assert_eq!(node.find_child_index(11), 1);
        assert_eq!(node.find_child_index(20), 1);
        assert_eq!(node.find_child_index(21), 2);
    }

    #[test]
    fn test_node_type_check() {
        let page = leaf_with(&[1]);
        assert_eq!(node_type(&page, PageId::new(0)).unwrap(), NodeType::Leaf);

        let mut bad = Page::new();
        bad.as_mut_slice()[0] = 9;
        assert!(node_type(&bad, PageId::new(0)).is_err());

        let mut overfull = leaf_with(&[]);
        overfull.leaf_mut().set_num_cells(LEAF_NODE_MAX_CELLS + 1);
        assert!(node_type(&overfull, PageId::new(0)).is_err());
    }
}
