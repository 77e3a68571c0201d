//! Page - the fundamental 4KB unit of storage.
//!
//! A [`Page`] is a raw 4KB byte array that serves as the unit of I/O
//! between disk and memory. The pager caches pages; the B-tree interprets
//! their bytes through typed node views.

use crate::common::config::PAGE_SIZE;
use crate::common::PageId;

use super::node_header::{NodeHeader, NodeType};

/// A page of data (4KB, 4KB-aligned).
///
/// # Clone Implementation
/// `Page` does NOT implement `Clone` in production code (copying 4KB should
/// be explicit, see [`Page::copy_from`]). A `#[cfg(test)]` Clone is provided
/// for tests.
///
/// # Example
/// ```
/// use tinytable::storage::page::Page;
///
/// let mut page = Page::new();
/// page.as_mut_slice()[0] = 0xFF;
/// assert_eq!(page.as_slice()[0], 0xFF);
/// ```
#[repr(align(4096))]
pub struct Page {
    data: [u8; PAGE_SIZE],
}

impl Page {
    /// Create a new zeroed page.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    /// Get immutable slice of page data.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get mutable slice of page data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Overwrite this page with the contents of another.
    pub fn copy_from(&mut self, other: &Page) {
        self.data.copy_from_slice(&other.data);
    }

    /// Get the size of a page.
    #[inline]
    pub const fn size() -> usize {
        PAGE_SIZE
    }

    /// Node type byte, or `None` if it is not a known type.
    #[inline]
    pub fn node_type(&self) -> Option<NodeType> {
        NodeType::from_u8(self.data[NodeHeader::OFFSET_NODE_TYPE])
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.data[NodeHeader::OFFSET_IS_ROOT] != 0
    }

    #[inline]
    pub fn set_root(&mut self, is_root: bool) {
        self.data[NodeHeader::OFFSET_IS_ROOT] = u8::from(is_root);
    }

    #[inline]
    pub fn parent(&self) -> PageId {
        let o = NodeHeader::OFFSET_PARENT;
        PageId::new(u32::from_le_bytes([
            self.data[o],
            self.data[o + 1],
            self.data[o + 2],
            self.data[o + 3],
        ]))
    }

    #[inline]
    pub fn set_parent(&mut self, parent: PageId) {
        let o = NodeHeader::OFFSET_PARENT;
        self.data[o..o + 4].copy_from_slice(&parent.0.to_le_bytes());
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

// Clone only available in tests - forces explicit copying in production
#[cfg(test)]
impl Clone for Page {
    fn clone(&self) -> Self {
        let mut new_page = Page::new();
        new_page.copy_from(self);
        new_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_and_alignment() {
        assert_eq!(std::mem::size_of::<Page>(), PAGE_SIZE);
        assert_eq!(std::mem::align_of::<Page>(), 4096);
    }

    #[test]
    fn test_page_read_write() {
        let mut page = Page::new();

        page.as_mut_slice()[0] = 0xFF;
        page.as_mut_slice()[4095] = 0xCD;

        assert_eq!(page.as_slice()[0], 0xFF);
        assert_eq!(page.as_slice()[4095], 0xCD);
    }

    #[test]
    fn test_copy_from() {
        let mut src = Page::new();
        src.as_mut_slice()[100] = 0xAB;

        let mut dst = Page::new();
        dst.as_mut_slice()[7] = 0x11;
        dst.copy_from(&src);

        assert_eq!(dst.as_slice()[100], 0xAB);
        assert_eq!(dst.as_slice()[7], 0);
    }

    #[test]
    fn test_header_accessors() {
        let mut page = Page::new();
        // A zeroed page reads as a non-root internal node.
        assert_eq!(page.node_type(), Some(NodeType::Internal));
        assert!(!page.is_root());

        let mut header = NodeHeader::new(NodeType::Leaf);
        header.parent = PageId::new(9);
        header.write_to(page.as_mut_slice());
        assert_eq!(page.node_type(), Some(NodeType::Leaf));
        assert_eq!(page.parent(), PageId::new(9));

        page.set_root(true);
        page.set_parent(PageId::new(12));
        assert!(page.is_root());
        assert_eq!(page.parent(), PageId::new(12));
        assert_eq!(page.node_type(), Some(NodeType::Leaf));
    }
}
