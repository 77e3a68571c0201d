//! Pager - the page cache between the B-tree and disk.
//!
//! The [`Pager`] provides:
//! - Lazy page loading indexed by page number
//! - Append-only page allocation
//! - Dirty tracking and explicit write-back

use tracing::{debug, error, trace, warn};

use crate::common::{Error, PageId, Result};
use crate::pager::PagerStats;
use crate::storage::page::Page;
use crate::storage::DiskManager;

/// A cache slot holding one page.
struct CachedPage {
    page: Box<Page>,
    /// Modified since it was last written to disk.
    dirty: bool,
}

/// Caches table pages in memory.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────┐
/// │                        Pager                         │
/// │  ┌────────────────────────────────────────────────┐  │
/// │  │ pages: Vec<Option<CachedPage>>  (index = page) │  │
/// │  │  [P0] [P1] [ -- ] [P3] ...                     │  │
/// │  └────────────────────────────────────────────────┘  │
/// │  ┌──────────────┐  ┌──────────────┐  ┌───────────┐   │
/// │  │  num_pages   │  │  max_pages   │  │disk_mngr  │   │
/// │  └──────────────┘  └──────────────┘  └───────────┘   │
/// └──────────────────────────────────────────────────────┘
/// ```
///
/// A cache miss for a page inside the file's extent reads it from disk; a
/// miss beyond the extent yields a zeroed page (a fresh allocation). Pages
/// stay cached until [`Pager::close`]. There is no eviction.
///
/// `num_pages` is the high-water mark of touched page numbers and is the
/// next number [`Pager::allocate_page`] hands out. Page numbers are never
/// reused.
///
/// # Usage
/// ```no_run
/// use tinytable::pager::Pager;
/// use tinytable::storage::DiskManager;
///
/// let dm = DiskManager::open_or_create("table.db")?;
/// let mut pager = Pager::new(dm, 128)?;
///
/// let page_id = pager.allocate_page()?;
/// pager.page_mut(page_id)?.as_mut_slice()[0] = 0xAB;
/// pager.close()?;
/// # Ok::<(), tinytable::Error>(())
/// ```
pub struct Pager {
    /// Handles all disk I/O.
    disk_manager: DiskManager,

    /// Page table: slot N caches page N once touched.
    pages: Vec<Option<CachedPage>>,

    /// One past the highest page number touched.
    num_pages: u32,

    /// Page numbers at or above this are rejected.
    max_pages: u32,

    /// Performance statistics.
    stats: PagerStats,
}

impl Pager {
    /// Create a pager over an opened file.
    ///
    /// # Errors
    /// - `Error::PageOutOfBounds` if the file already holds more than
    ///   `max_pages` pages
    pub fn new(disk_manager: DiskManager, max_pages: u32) -> Result<Self> {
        let num_pages = disk_manager.page_count();
        if num_pages > max_pages {
            return Err(Error::PageOutOfBounds {
                page: num_pages - 1,
                max: max_pages,
            });
        }

        Ok(Self {
            disk_manager,
            pages: Vec::new(),
            num_pages,
            max_pages,
            stats: PagerStats::default(),
        })
    }

    // ========================================================================
    // Public API: Page access
    // ========================================================================

    /// Fetch a page for reading.
    ///
    /// # Errors
    /// - `Error::PageOutOfBounds` if `page_id` is at or beyond the capacity
    /// - I/O errors on a cache miss
    pub fn page(&mut self, page_id: PageId) -> Result<&Page> {
        let cached = self.fetch(page_id)?;
        Ok(&cached.page)
    }

    /// Fetch a page for writing. The page is marked dirty.
    ///
    /// # Errors
    /// Same as [`Pager::page`].
    pub fn page_mut(&mut self, page_id: PageId) -> Result<&mut Page> {
        let cached = self.fetch(page_id)?;
        cached.dirty = true;
        Ok(&mut cached.page)
    }

    /// Hand out the next unused page number and materialize it as a zeroed
    /// page.
    ///
    /// # Errors
    /// - `Error::PageOutOfBounds` if the table is at capacity
    pub fn allocate_page(&mut self) -> Result<PageId> {
        let page_id = PageId::new(self.num_pages);
        self.fetch(page_id)?;
        self.stats.pages_allocated += 1;
        Ok(page_id)
    }

    // ========================================================================
    // Public API: Flush and close
    // ========================================================================

    /// Write a cached page to disk, dirty or not.
    ///
    /// Pages that were never loaded are left alone.
    pub fn flush(&mut self, page_id: PageId) -> Result<()> {
        let Some(Some(cached)) = self.pages.get_mut(page_id.0 as usize) else {
            return Ok(());
        };

        self.disk_manager.write_page(page_id, &cached.page)?;
        cached.dirty = false;
        self.stats.pages_written += 1;
        Ok(())
    }

    /// Write every dirty page to disk.
    pub fn flush_all(&mut self) -> Result<()> {
        for (index, slot) in self.pages.iter_mut().enumerate() {
            let Some(cached) = slot else { continue };
            if !cached.dirty {
                continue;
            }

            self.disk_manager
                .write_page(PageId::new(index as u32), &cached.page)?;
            cached.dirty = false;
            self.stats.pages_written += 1;
        }
        Ok(())
    }

    /// Flush all dirty pages, sync the file and release every buffer.
    ///
    /// Calling `close` more than once is harmless. Pages touched afterwards
    /// are reloaded from disk.
    pub fn close(&mut self) -> Result<()> {
        self.flush_all()?;
        self.disk_manager.sync()?;
        self.pages.clear();

        debug!(
            pages = self.num_pages,
            written = self.stats.pages_written,
            "pager closed"
        );
        Ok(())
    }

    // ========================================================================
    // Public API: Info
    // ========================================================================

    /// One past the highest page number in use.
    #[inline]
    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// Configured page capacity.
    #[inline]
    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// How many more pages can be allocated.
    #[inline]
    pub fn free_pages(&self) -> u32 {
        self.max_pages.saturating_sub(self.num_pages)
    }

    /// Whether any cached page has unwritten changes.
    pub fn has_dirty_pages(&self) -> bool {
        self.pages.iter().flatten().any(|cached| cached.dirty)
    }

    /// Get pager statistics.
    pub fn stats(&self) -> PagerStats {
        self.stats
    }

    // ========================================================================
    // Internal: Core fetch logic
    // ========================================================================

    /// Return the cache slot for a page, populating it on a miss.
    fn fetch(&mut self, page_id: PageId) -> Result<&mut CachedPage> {
        if page_id.0 >= self.max_pages {
            return Err(Error::PageOutOfBounds {
                page: page_id.0,
                max: self.max_pages,
            });
        }

        let index = page_id.0 as usize;
        if index >= self.pages.len() {
            self.pages.resize_with(index + 1, || None);
        }

        if self.pages[index].is_some() {
            self.stats.cache_hits += 1;
        } else {
            self.handle_cache_miss(page_id)?;
        }

        self.pages[index]
            .as_mut()
            .ok_or_else(|| Error::corrupted(format!("{} missing from page cache", page_id)))
    }

    /// Load a page from disk, or zero-initialize it beyond the file extent.
    fn handle_cache_miss(&mut self, page_id: PageId) -> Result<()> {
        self.stats.cache_misses += 1;

        let cached = if page_id.0 < self.disk_manager.page_count() {
            self.stats.pages_read += 1;
            CachedPage {
                page: Box::new(self.disk_manager.read_page(page_id)?),
                dirty: false,
            }
        } else {
            trace!(page = page_id.0, "materializing new page");
            CachedPage {
                page: Box::new(Page::new()),
                dirty: true,
            }
        };

        self.pages[page_id.0 as usize] = Some(cached);
        if page_id.0 >= self.num_pages {
            self.num_pages = page_id.0 + 1;
        }
        Ok(())
    }
}

impl Drop for Pager {
    fn drop(&mut self) {
        if !self.has_dirty_pages() {
            return;
        }
        warn!(pages = self.num_pages, "pager dropped without close, flushing");
        if let Err(e) = self.flush_all().and_then(|()| self.disk_manager.sync()) {
            error!(error = %e, "failed to flush pager on drop");
        }
    }
}
