//! Contiguous row band, resident across every column, while row-mode is on.
//!
//! `RowWindow` is pure storage plus the positioning/flush primitives from
//! §4.3. Coherence with the column cache (deciding *when* to flush, *when*
//! the cache is authoritative) is the engine's job — see
//! `crate::engine::cell`.

use std::path::Path;

use crate::cache::column_cache::ColumnCache;
use crate::error::BufmatResult;
use crate::storage::FileStore;

pub struct RowWindow {
    first_row: usize,
    max_rows: usize,
    /// One segment per column, each exactly `max_rows` long. `segments[c]`
    /// always corresponds to matrix column `c`.
    segments: Vec<Vec<f64>>,
}

impl RowWindow {
    /// Allocate an empty window (no columns yet) of width `max_rows`.
    pub fn new(max_rows: usize) -> Self {
        Self {
            first_row: 0,
            max_rows,
            segments: Vec::new(),
        }
    }

    pub fn first_row(&self) -> usize {
        self.first_row
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn num_columns(&self) -> usize {
        self.segments.len()
    }

    pub fn contains_row(&self, row: usize) -> bool {
        row >= self.first_row && row < self.first_row + self.max_rows
    }

    /// Read the cell at `(row, col)`, if both are within the window's
    /// current band and column count.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if !self.contains_row(row) || col >= self.segments.len() {
            return None;
        }
        Some(self.segments[col][row - self.first_row])
    }

    /// Write the cell at `(row, col)`, if both are resident. Returns
    /// whether the write happened.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> bool {
        if !self.contains_row(row) || col >= self.segments.len() {
            return false;
        }
        self.segments[col][row - self.first_row] = value;
        true
    }

    /// Grow the segment list by one zero-filled band for a freshly appended
    /// column.
    pub fn append_one_column(&mut self) {
        self.segments.push(vec![0.0; self.max_rows]);
    }

    /// Reallocate every segment to `new_max_rows`, discarding old contents —
    /// callers must `flush()` beforehand and `load_at()` afterward.
    pub fn reshape(&mut self, new_max_rows: usize) {
        self.max_rows = new_max_rows;
        for segment in &mut self.segments {
            segment.clear();
            segment.resize(new_max_rows, 0.0);
        }
    }

    /// Reposition the window to start at `min(r, rows - max_rows)` and
    /// refill every segment from disk, then overwrite the rows belonging to
    /// any column currently resident in `cache` (the cache is authoritative
    /// for its own columns at load time).
    pub fn load_at(
        &mut self,
        r: usize,
        rows: usize,
        paths: &[impl AsRef<Path>],
        file_store: &FileStore,
        cache: &ColumnCache,
    ) -> BufmatResult<()> {
        self.first_row = r.min(rows.saturating_sub(self.max_rows));
        for (col, segment) in self.segments.iter_mut().enumerate() {
            file_store.read_slice(paths[col].as_ref(), self.first_row, segment)?;
            if let Some(slot) = cache.locate(col) {
                let cached = cache.buf(slot);
                segment.copy_from_slice(&cached[self.first_row..self.first_row + self.max_rows]);
            }
        }
        tracing::trace!(first_row = self.first_row, max_rows = self.max_rows, "row window positioned");
        Ok(())
    }

    /// Write every segment back to its column file at `first_row`.
    pub fn flush(&self, paths: &[impl AsRef<Path>], file_store: &FileStore) -> BufmatResult<()> {
        for (col, segment) in self.segments.iter().enumerate() {
            file_store.write_slice(paths[col].as_ref(), self.first_row, segment)?;
        }
        tracing::trace!(first_row = self.first_row, "row window flushed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_paths(store: &FileStore, cols: usize, rows: usize) -> Vec<std::path::PathBuf> {
        (0..cols).map(|_| store.create_zero(rows).unwrap()).collect()
    }

    #[test]
    fn load_at_clamps_first_row_to_fit() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path(), "c_");
        let paths = make_paths(&store, 2, 10);
        let mut window = RowWindow::new(4);
        window.append_one_column();
        window.append_one_column();
        let cache = ColumnCache::new(1);

        window.load_at(9, 10, &paths, &store, &cache).unwrap();
        // first_row + max_rows must not exceed rows (10).
        assert_eq!(window.first_row(), 6);
    }

    #[test]
    fn load_at_prefers_cached_column_contents() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path(), "c_");
        let paths = make_paths(&store, 1, 5);
        store.write_whole(&paths[0], &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        let mut cache = ColumnCache::new(1);
        cache.push_new(0, vec![10.0, 20.0, 30.0, 40.0, 50.0]);

        let mut window = RowWindow::new(3);
        window.append_one_column();
        window.load_at(0, 5, &paths, &store, &cache).unwrap();

        assert_eq!(window.get(0, 0), Some(10.0));
        assert_eq!(window.get(1, 0), Some(20.0));
        assert_eq!(window.get(2, 0), Some(30.0));
    }

    #[test]
    fn flush_writes_band_back_to_disk() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path(), "c_");
        let paths = make_paths(&store, 1, 4);

        let mut window = RowWindow::new(4);
        window.append_one_column();
        let cache = ColumnCache::new(1);
        window.load_at(0, 4, &paths, &store, &cache).unwrap();
        window.set(2, 0, 99.0);
        window.flush(&paths, &store).unwrap();

        let mut buf = [0.0; 4];
        store.read_whole(&paths[0], &mut buf).unwrap();
        assert_eq!(buf, [0.0, 0.0, 99.0, 0.0]);
    }

    #[test]
    fn reshape_resets_segment_lengths() {
        let mut window = RowWindow::new(2);
        window.append_one_column();
        assert_eq!(window.max_rows(), 2);
        window.reshape(5);
        assert_eq!(window.max_rows(), 5);
        assert_eq!(window.get(4, 0), Some(0.0));
    }
}
