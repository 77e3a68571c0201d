//! Error types for tinytable.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
///
/// Logical and validation errors are raised before any page is modified, so
/// the table is still usable afterwards. Capacity and I/O errors may leave
/// the in-memory tree partially updated if they strike mid-split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The table ran out of addressable pages.
    Capacity,
    /// Disk failure or a file that is not a valid table.
    Io,
    /// Duplicate key on insert, missing key on delete.
    Logical,
    /// A row field does not fit its fixed-width slot.
    Validation,
}

/// All possible errors in tinytable.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file or a page within it does not have the expected layout.
    #[error("Corrupt table file: {0}")]
    Corrupted(String),

    /// A page number at or beyond the configured capacity was requested.
    #[error("Page {page} is out of bounds (max pages: {max})")]
    PageOutOfBounds { page: u32, max: u32 },

    /// An insert would need more new pages than the table has left.
    #[error("Table full: insert needs up to {needed} new pages, {available} available")]
    TableFull { needed: u32, available: u32 },

    /// A row with this id already exists.
    #[error("Duplicate key {0}")]
    DuplicateKey(u32),

    /// No row with this id exists.
    #[error("Key {0} not found")]
    KeyNotFound(u32),

    /// A string field is longer than its on-disk slot.
    #[error("{field} is {len} bytes long, maximum is {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::Corrupted(_) => ErrorKind::Io,
            Error::PageOutOfBounds { .. } | Error::TableFull { .. } => ErrorKind::Capacity,
            Error::DuplicateKey(_) | Error::KeyNotFound(_) => ErrorKind::Logical,
            Error::FieldTooLong { .. } => ErrorKind::Validation,
        }
    }

    /// Whether the table is guaranteed untouched after this error.
    ///
    /// `TableFull` is checked before a split begins, so it is recoverable
    /// too. `PageOutOfBounds` can only surface mid-operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Logical | ErrorKind::Validation)
            || matches!(self, Error::TableFull { .. })
    }

    pub(crate) fn corrupted(msg: impl Into<String>) -> Self {
        Error::Corrupted(msg.into())
    }
}
