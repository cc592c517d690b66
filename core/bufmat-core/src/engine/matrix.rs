//! The `BufferedMatrix` struct definition — the core data structure.

use std::path::PathBuf;

use crate::cache::{ClashTracker, ColumnCache, RowWindow};
use crate::error::{BufmatError, BufmatResult};
use crate::storage::FileStore;

/// An out-of-core 2-D array of `f64`, cached through a bounded column LRU
/// and an optional contiguous row window.
///
/// `rows` is fixed once, by [`BufferedMatrix::set_rows`]; `cols` grows by
/// [`BufferedMatrix::append_column`]. Every column lives in its own file
/// under `directory`; at most `max_cols` of them are resident in memory at
/// once. See the crate-level docs for the coherence discipline between the
/// column cache and the row window.
pub struct BufferedMatrix {
    pub(crate) rows: usize,
    pub(crate) rows_set: bool,
    pub(crate) cols: usize,
    pub(crate) col_mode: bool,
    pub(crate) read_only: bool,
    /// Configured row-window width, tracked even while `row_window` is
    /// `None` (column mode) so `set_row_mode(true)` and `resize_row_buffer`
    /// agree on the width to allocate.
    pub(crate) row_window_width: usize,
    /// Per-column file path, `paths[c]` is column `c`'s file. Len == `cols`.
    pub(crate) paths: Vec<PathBuf>,
    pub(crate) file_store: FileStore,
    pub(crate) cache: ColumnCache,
    pub(crate) row_window: Option<RowWindow>,
    pub(crate) clash: ClashTracker,
}

impl BufferedMatrix {
    /// Create an empty matrix (`rows = cols = 0`) with the given buffer
    /// capacities. Row count is fixed later, with [`Self::set_rows`].
    pub fn create(
        max_rows: usize,
        max_cols: usize,
        prefix: impl Into<String>,
        directory: impl Into<PathBuf>,
    ) -> BufmatResult<Self> {
        if max_rows == 0 {
            return Err(BufmatError::InvalidCapacity(
                "max_rows must be at least 1".to_string(),
            ));
        }
        if max_cols == 0 {
            return Err(BufmatError::InvalidCapacity(
                "max_cols must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            rows: 0,
            rows_set: false,
            cols: 0,
            col_mode: true,
            read_only: false,
            row_window_width: max_rows,
            paths: Vec::new(),
            file_store: FileStore::new(directory.into(), prefix.into()),
            cache: ColumnCache::new(max_cols),
            row_window: None,
            clash: ClashTracker::new(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn max_cols(&self) -> usize {
        self.cache.capacity()
    }

    pub fn max_rows(&self) -> usize {
        self.row_window_width
    }

    pub fn is_row_mode(&self) -> bool {
        !self.col_mode
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn prefix(&self) -> &str {
        self.file_store.prefix()
    }

    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.file_store.set_prefix(prefix);
    }

    pub fn directory(&self) -> &std::path::Path {
        self.file_store.directory()
    }

    /// Set the fixed row count. Succeeds exactly once, before any column
    /// has been appended's dimensions are otherwise touched.
    pub fn set_rows(&mut self, rows: usize) -> BufmatResult<()> {
        if self.rows_set {
            return Err(BufmatError::RowsAlreadySet { current: self.rows });
        }
        if rows == 0 {
            return Err(BufmatError::InvalidCapacity(
                "rows must be positive".to_string(),
            ));
        }
        self.rows = rows;
        self.rows_set = true;
        tracing::debug!(rows, "matrix row count fixed");
        Ok(())
    }

    /// Approximate resident memory, in bytes: the column cache plus the row
    /// window (if active).
    pub fn memory_in_use(&self) -> usize {
        let cache_bytes = self.cache.len() * self.rows * std::mem::size_of::<f64>();
        let window_bytes = self
            .row_window
            .as_ref()
            .map(|w| w.num_columns() * w.max_rows() * std::mem::size_of::<f64>())
            .unwrap_or(0);
        cache_bytes + window_bytes
    }

    /// Logical on-disk footprint, in bytes: `rows * cols * 8`.
    pub fn file_space_in_use(&self) -> usize {
        self.cols * self.rows * std::mem::size_of::<f64>()
    }

    pub(crate) fn check_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    /// Column visit order for a full scan: whatever's already cached, in
    /// cache order, then everything else ascending. Guarantees a scan
    /// touches each on-disk column at most once.
    pub(crate) fn ordered_columns(&self) -> Vec<usize> {
        let mut seen = vec![false; self.cols];
        let mut order = Vec::with_capacity(self.cols);
        for col in self.cache.resident_columns() {
            if !seen[col] {
                seen[col] = true;
                order.push(col);
            }
        }
        for col in 0..self.cols {
            if !seen[col] {
                order.push(col);
            }
        }
        order
    }
}

impl Drop for BufferedMatrix {
    /// Destruction flushes nothing by default; files already reflect
    /// committed state except for pages still in a cache. Every owned file
    /// is then removed.
    fn drop(&mut self) {
        for path in &self.paths {
            if let Err(err) = self.file_store.delete(path) {
                tracing::warn!(path = %path.display(), error = %err, "failed to delete column file on drop");
            }
        }
    }
}
