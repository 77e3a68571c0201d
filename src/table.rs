//! The public table handle.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::btree::{BTree, Rows, TreeSummary};
use crate::common::config::TableConfig;
use crate::common::{Error, PageId, Result};
use crate::pager::{Pager, PagerStats};
use crate::row::Row;
use crate::storage::DiskManager;

/// A single-file table of [`Row`]s keyed by id.
///
/// # Example
/// ```no_run
/// use tinytable::Table;
///
/// let mut table = Table::open("users.db")?;
/// table.insert_fields(1, "alice", "alice@example.com")?;
/// assert_eq!(table.find(1)?.map(|row| row.username().to_string()), Some("alice".into()));
/// table.close()?;
/// # Ok::<(), tinytable::Error>(())
/// ```
pub struct Table {
    path: PathBuf,
    config: TableConfig,
    tree: BTree,
    /// Counters of trees replaced by `delete`.
    retired_stats: PagerStats,
}

impl Table {
    /// Open the table at `path` with the default configuration, creating an
    /// empty file if none exists.
    ///
    /// # Errors
    /// - `Error::Corrupted` if the file length is not a multiple of the page
    ///   size or page 0 is not a valid root
    /// - `Error::PageOutOfBounds` if the file holds more pages than allowed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_config(path, TableConfig::default())
    }

    /// Open the table at `path` with an explicit configuration.
    ///
    /// # Errors
    /// Same as [`Table::open`].
    pub fn open_with_config<P: AsRef<Path>>(path: P, config: TableConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let disk_manager = DiskManager::open_or_create(&path)?;
        let pager = Pager::new(disk_manager, config.max_pages)?;
        let tree = BTree::open(pager)?;

        debug!(
            path = %path.display(),
            pages = tree.pager().num_pages(),
            "opened table"
        );
        Ok(Self {
            path,
            config,
            tree,
            retired_stats: PagerStats::default(),
        })
    }

    /// Flush every page and sync the file.
    pub fn close(mut self) -> Result<()> {
        self.tree.close()?;
        debug!(path = %self.path.display(), "closed table");
        Ok(())
    }

    /// Insert a row.
    ///
    /// # Errors
    /// - `Error::DuplicateKey` if a row with the same id exists
    /// - `Error::TableFull` if the table cannot grow enough to fit it
    pub fn insert(&mut self, row: &Row) -> Result<()> {
        self.tree.insert(row)
    }

    /// Build a row from its fields and insert it.
    ///
    /// # Errors
    /// - `Error::FieldTooLong` if a string does not fit its slot
    /// - everything [`Table::insert`] returns
    pub fn insert_fields(
        &mut self,
        id: u32,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<()> {
        let row = Row::new(id, username, email)?;
        self.insert(&row)
    }

    /// Row with this id, if present.
    pub fn find(&mut self, id: u32) -> Result<Option<Row>> {
        self.tree.get(id)
    }

    /// Lazy iterator over all rows in ascending id order.
    pub fn rows(&mut self) -> Rows<'_> {
        self.tree.rows()
    }

    /// All rows in ascending id order.
    pub fn scan(&mut self) -> Result<Vec<Row>> {
        self.rows().collect()
    }

    /// Remove the row with this id and return it.
    ///
    /// The table is rebuilt without the row in `<path>.rebuild`, which then
    /// replaces the original file. The rebuilt file is opened before it is
    /// renamed into place, so once the rename succeeds the handle already
    /// points at the new tree. Any failure leaves the handle on the original
    /// file with all its rows, and removes the temporary file.
    ///
    /// Rows are re-inserted in ascending order, which leaves leaves half full.
    /// The rebuilt tree can therefore need more pages than the live one.
    ///
    /// # Errors
    /// - `Error::KeyNotFound` if no row has this id (the file is untouched)
    /// - `Error::TableFull` if the rebuilt tree does not fit in
    ///   `max_pages`; the row is not deleted
    /// - I/O errors while writing, opening or renaming the rebuilt file; the
    ///   row is not deleted
    pub fn delete(&mut self, id: u32) -> Result<Row> {
        let removed = self.tree.get(id)?.ok_or(Error::KeyNotFound(id))?;
        let rebuild_path = rebuild_path(&self.path);

        let result = self
            .rebuild_without(id, &rebuild_path)
            .and_then(|()| self.swap_in(&rebuild_path));
        if let Err(e) = result {
            discard(&rebuild_path);
            return Err(e);
        }

        debug!(id, path = %self.path.display(), "deleted row");
        Ok(removed)
    }

    /// Write every row except `skip` into a fresh table at `dst_path`.
    fn rebuild_without(&mut self, skip: u32, dst_path: &Path) -> Result<()> {
        if dst_path.exists() {
            fs::remove_file(dst_path)?;
        }

        let disk_manager = DiskManager::create(dst_path)?;
        let mut dst = BTree::open(Pager::new(disk_manager, self.config.max_pages)?)?;
        let copied = self.tree.copy_rows_except(skip, &mut dst)?;
        dst.close()?;

        debug!(skip, rows = copied, path = %dst_path.display(), "rebuilt table");
        Ok(())
    }

    /// Replace the live tree with the one in `rebuilt`.
    ///
    /// The rebuilt tree is opened first and keeps its file handle across the
    /// rename, so nothing can fail after the rename. Until then `self.tree`
    /// still reads the original file.
    fn swap_in(&mut self, rebuilt: &Path) -> Result<()> {
        self.tree.close()?;

        let disk_manager = DiskManager::open(rebuilt)?;
        let tree = BTree::open(Pager::new(disk_manager, self.config.max_pages)?)?;
        fs::rename(rebuilt, &self.path)?;

        self.retired_stats += self.tree.pager().stats();
        self.tree = tree;
        Ok(())
    }

    /// Number of rows, counted by a full scan.
    pub fn len(&mut self) -> Result<usize> {
        self.rows().try_fold(0, |count, row| row.map(|_| count + 1))
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        Ok(self.tree.start()?.is_end())
    }

    /// Levels from root to leaves.
    pub fn depth(&mut self) -> Result<usize> {
        self.tree.depth()
    }

    /// Check the tree's structural invariants.
    ///
    /// # Errors
    /// - `Error::Corrupted` describing the first violation
    pub fn verify(&mut self) -> Result<TreeSummary> {
        self.tree.verify()
    }

    /// Pages in use, including any not yet flushed.
    pub fn page_count(&self) -> u32 {
        self.tree.pager().num_pages()
    }

    /// Pager counters, accumulated across the rebuilds done by `delete`.
    pub fn stats(&self) -> PagerStats {
        let mut stats = self.retired_stats;
        stats += self.tree.pager().stats();
        stats
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> TableConfig {
        self.config
    }

    pub fn root_page(&self) -> PageId {
        self.tree.root()
    }
}

/// Remove a leftover rebuild file, if any.
fn discard(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to remove partial rebuild");
        }
    }
}

fn rebuild_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".rebuild");
    PathBuf::from(name)
}
