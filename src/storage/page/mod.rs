//! Page types and layout.
//!
//! This module contains:
//! - [`Page`] - The raw 4KB data container
//! - [`NodeHeader`] - The 6-byte header at the start of every node page
//! - [`NodeType`] - Discriminator between leaf and internal nodes

mod node_header;
#[allow(clippy::module_inception)]
mod page;

pub use node_header::{NodeHeader, NodeType};
pub use page::Page;
