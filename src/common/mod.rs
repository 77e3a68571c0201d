//! Common types and utilities shared across tinytable.
//!
//! - Configuration constants and [`TableConfig`](config::TableConfig)
//! - Error types
//! - [`PageId`]

pub mod config;
pub mod error;
mod page_id;

pub use error::{Error, ErrorKind, Result};
pub use page_id::PageId;
