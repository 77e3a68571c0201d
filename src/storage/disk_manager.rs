//! Disk Manager - low-level file I/O for table pages.
//!
//! The [`DiskManager`] is the page store: it reads and writes whole pages at
//! fixed offsets and knows nothing about what the pages contain.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::trace;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;

/// Manages disk I/O for a single table file.
///
/// # File Layout
/// The table is stored as a single file with pages laid out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (root)  │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// There is no file header: the file length must be an exact multiple of
/// [`PAGE_SIZE`] and page 0 always holds the B-tree root.
///
/// # Durability
/// Writes are not individually synced. Call [`DiskManager::sync`] once the
/// batch of page writes is complete (the pager does this on close).
pub struct DiskManager {
    file: File,
    /// Number of whole pages currently in the file.
    page_count: u32,
}

impl DiskManager {
    /// Create a new table file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self {
            file,
            page_count: 0,
        })
    }

    /// Open an existing table file.
    ///
    /// # Errors
    /// - I/O errors if the file doesn't exist or cannot be opened
    /// - `Error::Corrupted` if the file length is not a whole number of pages
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let file_size = file.metadata()?.len();
        if file_size % PAGE_SIZE as u64 != 0 {
            return Err(Error::corrupted(format!(
                "file length {} is not a multiple of the page size {}",
                file_size, PAGE_SIZE
            )));
        }
        let page_count = u32::try_from(file_size / PAGE_SIZE as u64).map_err(|_| {
            Error::corrupted(format!("file length {} exceeds addressable pages", file_size))
        })?;

        Ok(Self { file, page_count })
    }

    /// Open an existing table file, or create if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Read a page from disk.
    ///
    /// # Errors
    /// Returns `Error::Corrupted` if the page lies beyond the end of the file.
    pub fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        if page_id.0 >= self.page_count {
            return Err(Error::corrupted(format!(
                "{} is beyond the end of the file ({} pages)",
                page_id, self.page_count
            )));
        }

        self.file.seek(SeekFrom::Start(page_id.file_offset()))?;

        let mut page = Page::new();
        self.file.read_exact(page.as_mut_slice())?;
        trace!(page = page_id.0, "read page");

        Ok(page)
    }

    /// Write a page to disk.
    ///
    /// Writing past the current end of the file extends it.
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        self.file.seek(SeekFrom::Start(page_id.file_offset()))?;
        self.file.write_all(page.as_slice())?;
        trace!(page = page_id.0, "wrote page");

        if page_id.0 >= self.page_count {
            self.page_count = page_id.0 + 1;
        }

        Ok(())
    }

    /// Flush file contents and metadata to stable storage.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Get the number of pages in the file.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }
}
