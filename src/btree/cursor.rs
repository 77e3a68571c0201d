//! Cursor positions and ordered row iteration.

use crate::btree::BTree;
use crate::common::{Error, PageId, Result};
use crate::row::Row;
use crate::storage::page::NodeType;

/// A position at a leaf cell.
///
/// Cursors come from [`BTree::find`] (the cell holding a key, or where it
/// would be inserted) and [`BTree::start`] (the first row). A cursor holds
/// no borrow; every operation takes the tree explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    page: PageId,
    cell: usize,
    end_of_table: bool,
}

impl Cursor {
    pub(crate) fn new(page: PageId, cell: usize) -> Self {
        Self {
            page,
            cell,
            end_of_table: false,
        }
    }

    /// Leaf page the cursor points into.
    #[inline]
    pub fn page(&self) -> PageId {
        self.page
    }

    /// Cell index within the leaf.
    #[inline]
    pub fn cell(&self) -> usize {
        self.cell
    }

    /// Whether the cursor has moved past the last row.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.end_of_table
    }

    /// Key at the cursor, `None` past the end of the leaf.
    pub fn key(&self, tree: &mut BTree) -> Result<Option<u32>> {
        if self.end_of_table {
            return Ok(None);
        }
        let leaf = tree.pager.page(self.page)?.leaf();
        Ok((self.cell < leaf.num_cells()).then(|| leaf.key(self.cell)))
    }

    /// Row at the cursor, `None` past the end of the leaf.
    pub fn row(&self, tree: &mut BTree) -> Result<Option<Row>> {
        if self.end_of_table {
            return Ok(None);
        }
        let leaf = tree.pager.page(self.page)?.leaf();
        if self.cell < leaf.num_cells() {
            leaf.row(self.cell).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Step to the next row in key order, following the leaf chain.
    pub fn advance(&mut self, tree: &mut BTree) -> Result<()> {
        if self.end_of_table {
            return Ok(());
        }
        self.cell += 1;
        self.settle(tree)
    }

    /// Move forward until the cursor names an existing cell or the end.
    pub(crate) fn settle(&mut self, tree: &mut BTree) -> Result<()> {
        let mut hops = 0u32;
        loop {
            if tree.node_type(self.page)? != NodeType::Leaf {
                return Err(Error::corrupted(format!(
                    "{} in the leaf chain is not a leaf",
                    self.page
                )));
            }
            let leaf = tree.pager.page(self.page)?.leaf();
            if self.cell < leaf.num_cells() {
                return Ok(());
            }
            match leaf.next_leaf() {
                Some(next) => {
                    hops += 1;
                    if hops > tree.pager.num_pages() {
                        return Err(Error::corrupted("leaf chain contains a cycle"));
                    }
                    self.page = next;
                    self.cell = 0;
                }
                None => {
                    self.end_of_table = true;
                    return Ok(());
                }
            }
        }
    }
}

/// Lazy ascending iterator over every row of a tree.
///
/// Holds the tree mutably for its lifetime, so the tree cannot change
/// underneath it. Created by [`BTree::rows`]. After an error the iterator
/// yields `None`.
pub struct Rows<'a> {
    tree: &'a mut BTree,
    cursor: Option<Cursor>,
    done: bool,
}

impl<'a> Rows<'a> {
    pub(crate) fn new(tree: &'a mut BTree) -> Self {
        Self {
            tree,
            cursor: None,
            done: false,
        }
    }

    fn step(&mut self) -> Result<Option<Row>> {
        let mut cursor = match self.cursor {
            Some(cursor) => cursor,
            None => self.tree.start()?,
        };

        let row = cursor.row(self.tree)?;
        cursor.advance(self.tree)?;
        self.cursor = Some(cursor);
        Ok(row)
    }
}

impl Iterator for Rows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::btree::layout::{LEAF_NODE_LEFT_SPLIT_COUNT, LEAF_NODE_MAX_CELLS};
    use crate::btree::test_util::*;

    #[test]
    fn test_advance_crosses_leaves() {
        let (mut tree, _dir) = create_test_tree(64);
        let count = LEAF_NODE_MAX_CELLS as u32 * 3;
        for id in 1..=count {
            tree.insert(&row(id)).unwrap();
        }

        let mut cursor = tree.start().unwrap();
        let first_page = cursor.page();
        let mut seen = Vec::new();
        while !cursor.is_end() {
            seen.push(cursor.key(&mut tree).unwrap().unwrap());
            cursor.advance(&mut tree).unwrap();
        }

        assert_eq!(seen, (1..=count).collect::<Vec<_>>());
        assert_ne!(cursor.page(), first_page);
        assert_eq!(cursor.row(&mut tree).unwrap(), None);
    }

    #[test]
    fn test_advance_at_end_is_noop() {
        let (mut tree, _dir) = create_test_tree(16);
        tree.insert(&row(1)).unwrap();

        let mut cursor = tree.start().unwrap();
        cursor.advance(&mut tree).unwrap();
        assert!(cursor.is_end());

        let before = cursor;
        cursor.advance(&mut tree).unwrap();
        assert_eq!(cursor, before);
    }

    #[test]
    fn test_settle_past_last_leaf_reaches_end() {
        let (mut tree, _dir) = create_test_tree(16);
        for id in 1..=(LEAF_NODE_MAX_CELLS as u32 + 1) {
            tree.insert(&row(id * 10)).unwrap();
        }

        // Larger than every key: one past the last cell of the last leaf.
        let mut cursor = tree.find(1000).unwrap();
        assert_eq!(cursor.key(&mut tree).unwrap(), None);
        assert!(!cursor.is_end());
        cursor.settle(&mut tree).unwrap();
        assert!(cursor.is_end());
    }

    #[test]
    fn test_rows_stops_after_error() {
        let (mut tree, _dir) = create_test_tree(16);
        for id in 1..=3 {
            tree.insert(&row(id)).unwrap();
        }
        // Corrupt the username of the second row.
        let value = crate::btree::layout::LEAF_NODE_HEADER_SIZE
            + crate::btree::layout::LEAF_NODE_CELL_SIZE
            + crate::btree::layout::LEAF_NODE_VALUE_OFFSET
            + 4;
        tree.pager
            .page_mut(PageId::ROOT)
            .unwrap()
            .as_mut_slice()[value] = 0xFF;

        let results: Vec<_> = tree.rows().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_settle_rejects_corrupt_next_leaf() {
        let (mut tree, _dir) = create_test_tree(16);
        for id in 1..=(LEAF_NODE_MAX_CELLS as u32 + 1) {
            tree.insert(&row(id)).unwrap();
        }
        let first = tree.start().unwrap().page;

        // A leaf claiming more cells than fit in a page.
        let bogus = tree.pager.allocate_page().unwrap();
        let mut leaf = tree.pager.page_mut(bogus).unwrap().leaf_mut();
        leaf.initialize();
        leaf.set_num_cells(1000);
        tree.pager
            .page_mut(first)
            .unwrap()
            .leaf_mut()
            .set_next_leaf(Some(bogus));

        let results: Vec<_> = tree.rows().collect();
        let (last, rest) = results.split_last().unwrap();
        assert!(rest.iter().all(|r| r.is_ok()));
        assert!(matches!(last, Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_settle_rejects_internal_page_in_chain() {
        let (mut tree, _dir) = create_test_tree(16);
        for id in 1..=(LEAF_NODE_MAX_CELLS as u32 + 1) {
            tree.insert(&row(id)).unwrap();
        }
        let mut cursor = tree.start().unwrap();
        tree.pager
            .page_mut(cursor.page)
            .unwrap()
            .leaf_mut()
            .set_next_leaf(Some(PageId::ROOT));

        for _ in 1..LEAF_NODE_LEFT_SPLIT_COUNT {
            cursor.advance(&mut tree).unwrap();
        }
        assert!(matches!(cursor.advance(&mut tree), Err(Error::Corrupted(_))));
    }
}
