//! Pager statistics tracking.

use std::fmt;
use std::ops::AddAssign;

/// Counters maintained by the [`Pager`](super::Pager).
///
/// The pager is owned by a single table and mutated through `&mut self`, so
/// the counters are plain integers.
///
/// # Example
/// ```
/// use tinytable::PagerStats;
///
/// let stats = PagerStats {
///     cache_hits: 7,
///     cache_misses: 3,
///     ..PagerStats::default()
/// };
/// assert_eq!(stats.hit_rate(), 0.7);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PagerStats {
    /// Number of page lookups served from the cache.
    pub cache_hits: u64,

    /// Number of page lookups that had to populate a cache entry.
    pub cache_misses: u64,

    /// Number of pages read from disk.
    pub pages_read: u64,

    /// Number of pages written to disk.
    pub pages_written: u64,

    /// Number of page numbers handed out by `allocate_page`.
    pub pages_allocated: u64,
}

impl PagerStats {
    /// Calculate cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

impl AddAssign for PagerStats {
    fn add_assign(&mut self, other: Self) {
        self.cache_hits += other.cache_hits;
        self.cache_misses += other.cache_misses;
        self.pages_read += other.pages_read;
        self.pages_written += other.pages_written;
        self.pages_allocated += other.pages_allocated;
    }
}

impl fmt::Display for PagerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ hits: {}, misses: {}, read: {}, written: {}, allocated: {}, \
             hit_rate: {:.2}% }}",
            self.cache_hits,
            self.cache_misses,
            self.pages_read,
            self.pages_written,
            self.pages_allocated,
            self.hit_rate() * 100.0
        )
    }
}
