//! Configuration for tinytable.
//!
//! Layout constants live here and in [`crate::btree::layout`]. Runtime knobs
//! are grouped in [`TableConfig`].

/// Size of a page in bytes (4KB).
///
/// Every node occupies exactly one page, and the database file is a flat
/// sequence of pages: page N lives at file offset `N × PAGE_SIZE`.
pub const PAGE_SIZE: usize = 4096;

/// Default maximum number of pages a table may address.
///
/// The page cache grows on demand, so this is a bound rather than a
/// preallocation. At 13 rows per leaf it allows well over 20,000 rows.
pub const DEFAULT_MAX_PAGES: u32 = 4096;

/// Runtime configuration for opening a [`Table`](crate::Table).
///
/// # Example
/// ```
/// use tinytable::TableConfig;
///
/// let config = TableConfig::default().with_max_pages(64);
/// assert_eq!(config.max_pages, 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableConfig {
    /// Upper bound on page numbers the pager will hand out.
    ///
    /// Touching page `max_pages` or beyond fails with
    /// [`Error::PageOutOfBounds`](crate::Error::PageOutOfBounds).
    pub max_pages: u32,
}

impl TableConfig {
    /// Set the page capacity.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_power_of_two() {
        assert!(PAGE_SIZE.is_power_of_two());
        assert_eq!(PAGE_SIZE, 4096);
    }

    #[test]
    fn test_default_config() {
        let config = TableConfig::default();
        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
        assert_eq!(config.with_max_pages(8).max_pages, 8);
    }
}
