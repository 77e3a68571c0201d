//! tinytable - a single-file, disk-backed B-tree table.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            Table                                │
//! │        open / insert / find / rows / delete / close             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                  B-tree (btree/)                         │   │
//! │  │   search → insert + split → root promotion → verify      │   │
//! │  │   Cursor / Rows: ordered scans along the leaf chain      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                  Pager (pager/)                          │   │
//! │  │   lazily loaded page cache, dirty tracking, statistics   │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                 Storage (storage/)                       │   │
//! │  │        DiskManager + Page + NodeHeader                   │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, Error, config)
//! - [`storage`] - Disk I/O and the page buffer
//! - [`pager`] - Page cache
//! - [`btree`] - Node layout, search, insertion and verification
//! - [`row`] - The fixed-width row format
//!
//! # Quick Start
//! ```no_run
//! use tinytable::{Table, TableConfig};
//!
//! let mut table = Table::open_with_config("users.db", TableConfig::default())?;
//!
//! table.insert_fields(2, "bob", "bob@example.com")?;
//! table.insert_fields(1, "alice", "alice@example.com")?;
//!
//! for row in table.rows() {
//!     println!("{}", row?);
//! }
//!
//! table.delete(2)?;
//! table.close()?;
//! # Ok::<(), tinytable::Error>(())
//! ```

pub mod btree;
pub mod common;
pub mod pager;
pub mod row;
pub mod storage;
mod table;

// Re-export commonly used items at crate root for convenience
pub use common::config::{TableConfig, PAGE_SIZE};
pub use common::{Error, ErrorKind, PageId, Result};

pub use btree::{Cursor, Rows, TreeSummary};
pub use pager::PagerStats;
pub use row::Row;
pub use table::Table;
