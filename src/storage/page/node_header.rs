//! Node header and type definitions.
//!
//! Every B-tree page starts with a [`NodeHeader`]:
//! - [`NodeType`] discriminator
//! - root flag
//! - parent page pointer

use crate::common::PageId;

/// Kind of node stored in a page.
///
/// Uses `#[repr(u8)]` to guarantee a 1-byte representation for serialization.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// Separator keys and child pointers.
    Internal = 0,
    /// Sorted key/row cells.
    Leaf = 1,
}

impl NodeType {
    /// Convert from u8, returning `None` for unknown values.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(NodeType::Internal),
            1 => Some(NodeType::Leaf),
            _ => None,
        }
    }
}

/// Metadata stored at the beginning of every node page.
///
/// # Layout (6 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       1     node_type (NodeType as u8)
/// 1       1     is_root (0 or 1)
/// 2       4     parent (page number, little-endian)
/// ```
///
/// The parent pointer of the root is not meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeader {
    /// Type of this node.
    pub node_type: NodeType,
    /// Whether this node is the tree root.
    pub is_root: bool,
    /// Page holding this node's parent.
    pub parent: PageId,
}

impl NodeHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 6;

    /// Offset of each field within the header.
    pub const OFFSET_NODE_TYPE: usize = 0;
    pub const OFFSET_IS_ROOT: usize = 1;
    pub const OFFSET_PARENT: usize = 2;

    /// Create a non-root header with the given node type.
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            is_root: false,
            parent: PageId::new(0),
        }
    }

    /// Write this header to the beginning of a byte slice.
    ///
    /// # Panics
    /// Panics if `data.len() < NodeHeader::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "buffer too small for NodeHeader");

        data[Self::OFFSET_NODE_TYPE] = self.node_type as u8;
        data[Self::OFFSET_IS_ROOT] = u8::from(self.is_root);
        data[Self::OFFSET_PARENT..Self::OFFSET_PARENT + 4]
            .copy_from_slice(&self.parent.0.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_type_from_u8() {
        assert_eq!(NodeType::from_u8(0), Some(NodeType::Internal));
        assert_eq!(NodeType::from_u8(1), Some(NodeType::Leaf));
        assert_eq!(NodeType::from_u8(2), None);
        assert_eq!(NodeType::from_u8(255), None);
    }

    #[test]
    fn test_node_header_byte_layout() {
        let header = NodeHeader {
            node_type: NodeType::Leaf,
            is_root: true,
            parent: PageId::new(0x04030201), // Little-endian: 01 02 03 04
        };

        let mut buffer = [0u8; NodeHeader::SIZE];
        header.write_to(&mut buffer);

        assert_eq!(buffer, [1, 1, 0x01, 0x02, 0x03, 0x04]);
    }
}
