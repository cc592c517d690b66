//! Single-cell access: `get`/`set` and the coherence dance between the row
//! window and the column cache (§4.4/§4.5).

use crate::cache::column_cache::CacheEntry;
use crate::error::{BufmatError, BufmatResult};

use super::matrix::BufferedMatrix;

impl BufferedMatrix {
    /// Read `(row, col)`. Returns `Ok(None)` for an out-of-range cell rather
    /// than an error — only malformed requests (negative-equivalent) are
    /// errors; a cell past the current extent is simply absent.
    pub fn get(&mut self, row: usize, col: usize) -> BufmatResult<Option<f64>> {
        if !self.check_bounds(row, col) {
            return Ok(None);
        }
        if self.col_mode {
            return self.get_col_mode(row, col).map(Some);
        }
        if let Some(v) = self.row_window.as_ref().unwrap().get(row, col) {
            if self.cache.contains(col) {
                self.record_clash(row, col)?;
            }
            return Ok(Some(v));
        }
        if let Some(slot) = self.cache.locate(col) {
            self.clear_clash()?;
            return Ok(Some(self.cache.buf(slot)[row]));
        }
        self.handle_row_mode_miss(row, col)?;
        let v = self
            .row_window
            .as_ref()
            .unwrap()
            .get(row, col)
            .expect("row window was just positioned over this cell");
        self.record_clash(row, col)?;
        Ok(Some(v))
    }

    /// Write `value` at `(row, col)`. Returns whether the cell was in range.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> BufmatResult<bool> {
        if self.read_only {
            return Err(BufmatError::ReadOnly);
        }
        if !self.check_bounds(row, col) {
            return Ok(false);
        }
        if self.col_mode {
            self.set_col_mode(row, col, value)?;
            return Ok(true);
        }
        if self.row_window.as_mut().unwrap().set(row, col, value) {
            if self.cache.contains(col) {
                self.record_clash(row, col)?;
            }
            return Ok(true);
        }
        if let Some(slot) = self.cache.locate(col) {
            self.cache.buf_mut(slot)[row] = value;
            return Ok(true);
        }
        self.handle_row_mode_miss(row, col)?;
        self.row_window.as_mut().unwrap().set(row, col, value);
        self.record_clash(row, col)?;
        Ok(true)
    }

    /// Flat-index accessor: `index = col * rows + row`.
    pub fn get_single_index(&mut self, index: usize) -> BufmatResult<Option<f64>> {
        if self.rows == 0 {
            return Ok(None);
        }
        let (row, col) = (index % self.rows, index / self.rows);
        self.get(row, col)
    }

    pub fn set_single_index(&mut self, index: usize, value: f64) -> BufmatResult<bool> {
        if self.rows == 0 {
            return Ok(false);
        }
        let (row, col) = (index % self.rows, index / self.rows);
        self.set(row, col, value)
    }

    fn get_col_mode(&mut self, row: usize, col: usize) -> BufmatResult<f64> {
        if let Some(slot) = self.cache.locate(col) {
            return Ok(self.cache.buf(slot)[row]);
        }
        self.load_column_into_cache(col)?;
        let slot = self.cache.locate(col).expect("just loaded");
        Ok(self.cache.buf(slot)[row])
    }

    fn set_col_mode(&mut self, row: usize, col: usize, value: f64) -> BufmatResult<()> {
        if let Some(slot) = self.cache.locate(col) {
            self.cache.buf_mut(slot)[row] = value;
            return Ok(());
        }
        self.load_column_into_cache(col)?;
        let slot = self.cache.locate(col).expect("just loaded");
        self.cache.buf_mut(slot)[row] = value;
        Ok(())
    }

    /// Record a new clash at `(row, col)`, first reconciling whatever clash
    /// is currently pending. The tracker holds only one slot, so the
    /// previous entry must always be folded into the column cache before it
    /// is overwritten — otherwise a later eviction can write back a column
    /// buffer that never picked up the earlier clash's value.
    fn record_clash(&mut self, row: usize, col: usize) -> BufmatResult<()> {
        self.clear_clash()?;
        self.clash.record(row, col);
        Ok(())
    }

    /// Reconcile a pending clash: the row window's value for the clashing
    /// cell overwrites the column cache's. Idempotent, and a no-op in
    /// read-only row mode, where no write could have produced a genuine
    /// divergence in the first place.
    pub(crate) fn clear_clash(&mut self) -> BufmatResult<()> {
        let Some((row, col)) = self.clash.pending() else {
            return Ok(());
        };
        if !(self.read_only && !self.col_mode) {
            if let (Some(window), Some(slot)) = (self.row_window.as_ref(), self.cache.locate(col))
            {
                if let Some(window_value) = window.get(row, col) {
                    self.cache.buf_mut(slot)[row] = window_value;
                }
            }
        }
        self.clash.clear();
        Ok(())
    }

    /// Bring `row` and `col` into cache, in the order described by §4.5:
    /// reconcile any pending clash, flush the current row window, reposition
    /// it around `row`, then load `col` into the column cache (evicting the
    /// oldest resident column first if the cache is full). The clash must
    /// be reconciled before that possible eviction, or the write-back could
    /// persist a column buffer that never picked up the clashing value.
    fn handle_row_mode_miss(&mut self, row: usize, col: usize) -> BufmatResult<()> {
        self.clear_clash()?;
        self.row_window
            .as_ref()
            .unwrap()
            .flush(&self.paths, &self.file_store)?;
        let rows = self.rows;
        self.row_window.as_mut().unwrap().load_at(
            row,
            rows,
            &self.paths,
            &self.file_store,
            &self.cache,
        )?;
        self.load_column_into_cache(col)?;
        Ok(())
    }

    /// Ensure `col` is resident in the column cache, evicting and
    /// writing back the oldest resident column if the cache is already
    /// full. No-op if `col` is already cached.
    pub(crate) fn load_column_into_cache(&mut self, col: usize) -> BufmatResult<()> {
        if self.cache.contains(col) {
            return Ok(());
        }
        let mut buf = if self.cache.is_full() {
            let evicted = self.cache.pop_oldest().expect("cache reported full");
            if !self.read_only {
                self.file_store
                    .write_whole(&self.paths[evicted.col], &evicted.data)?;
            }
            evicted.data
        } else {
            vec![0.0; self.rows]
        };
        self.file_store.read_whole(&self.paths[col], &mut buf)?;
        self.cache.push_back_entry(CacheEntry { col, data: buf });
        tracing::trace!(col, "column loaded into cache");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fresh(max_rows: usize, max_cols: usize, rows: usize) -> (tempfile::TempDir, BufferedMatrix) {
        let dir = tempdir().unwrap();
        let mut m = BufferedMatrix::create(max_rows, max_cols, "m_", dir.path()).unwrap();
        m.set_rows(rows).unwrap();
        (dir, m)
    }

    #[test]
    fn write_then_read_back_col_mode() {
        let (_dir, mut m) = fresh(2, 2, 4);
        m.append_column().unwrap();
        m.set(0, 0, 1.5).unwrap();
        m.set(3, 0, 9.5).unwrap();
        assert_eq!(m.get(0, 0).unwrap(), Some(1.5));
        assert_eq!(m.get(3, 0).unwrap(), Some(9.5));
    }

    #[test]
    fn out_of_range_reads_are_none_not_errors() {
        let (_dir, mut m) = fresh(2, 2, 4);
        m.append_column().unwrap();
        assert_eq!(m.get(10, 0).unwrap(), None);
        assert_eq!(m.get(0, 5).unwrap(), None);
    }

    #[test]
    fn read_only_rejects_writes() {
        let (_dir, mut m) = fresh(2, 2, 4);
        m.append_column().unwrap();
        m.read_only = true;
        assert!(m.set(0, 0, 1.0).is_err());
    }

    #[test]
    fn single_index_round_trip() {
        let (_dir, mut m) = fresh(2, 2, 3);
        m.append_column().unwrap();
        m.append_column().unwrap();
        m.set_single_index(4, 42.0).unwrap(); // row 1, col 1
        assert_eq!(m.get(1, 1).unwrap(), Some(42.0));
        assert_eq!(m.get_single_index(4).unwrap(), Some(42.0));
    }

    #[test]
    fn two_clashes_on_the_same_resident_column_both_survive_eviction() {
        // max_cols=1, row window spans rows [0,2): two successive clashing
        // writes to the same cached column must both reconcile into the
        // cache before a later miss on a different column evicts it.
        let (_dir, mut m) = fresh(2, 1, 6);
        m.append_column().unwrap();
        m.append_column().unwrap();
        m.set(0, 1, 5.0).unwrap(); // loads col 1 into the (only) cache slot
        m.set_row_mode(true).unwrap(); // window covers rows [0,2)
        m.set(0, 1, 100.0).unwrap(); // clash (0,1): col 1 is cached
        m.set(1, 1, 200.0).unwrap(); // clash (1,1): must reconcile (0,1) first
        m.get(4, 0).unwrap(); // miss on col 0 evicts col 1, writing it back
        assert_eq!(m.get(0, 1).unwrap(), Some(100.0));
        assert_eq!(m.get(1, 1).unwrap(), Some(200.0));
    }

    #[test]
    fn row_mode_eviction_and_clash_reconcile_across_columns() {
        let (_dir, mut m) = fresh(2, 1, 6);
        m.append_column().unwrap();
        m.append_column().unwrap();
        m.append_column().unwrap();
        m.set_row_mode(true).unwrap();
        for col in 0..3 {
            m.set(0, col, col as f64).unwrap();
        }
        for col in 0..3 {
            assert_eq!(m.get(0, col).unwrap(), Some(col as f64));
        }
    }
}
