//! Page cache.
//!
//! The pager sits between the B-tree and the [`DiskManager`](crate::storage::DiskManager).
//! It keeps every touched page resident until the table is closed.
//!
//! # Components
//! - [`Pager`] - The page cache and page-number allocator
//! - [`PagerStats`] - Cache and I/O counters

#[allow(clippy::module_inception)]
mod pager;
mod stats;

pub use pager::Pager;
pub use stats::PagerStats;
