//! Column append (§4.6).

use crate::error::{BufmatError, BufmatResult};

use super::matrix::BufferedMatrix;

impl BufferedMatrix {
    /// Append a new, zero-filled column. Returns its index. The new column
    /// becomes the cache's most-recently-loaded entry, evicting (and
    /// writing back) the oldest resident column first if the cache is
    /// already full; its file is created from that same cache buffer.
    pub fn append_column(&mut self) -> BufmatResult<usize> {
        if self.read_only {
            return Err(BufmatError::ReadOnly);
        }
        if !self.rows_set {
            return Err(BufmatError::RowsNotSet);
        }
        if self.cache.is_full() {
            self.clear_clash()?;
            let evicted = self.cache.pop_oldest().expect("cache reported full");
            self.file_store
                .write_whole(&self.paths[evicted.col], &evicted.data)?;
        }
        let new_col = self.cols;
        let buf = vec![0.0; self.rows];
        let path = self.file_store.create_zero(self.rows)?;
        self.paths.push(path);
        self.cols += 1;
        self.cache.push_new(new_col, buf);
        if let Some(window) = self.row_window.as_mut() {
            window.append_one_column();
        }
        tracing::debug!(col = new_col, "column appended");
        Ok(new_col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_requires_rows_set() {
        let dir = tempdir().unwrap();
        let mut m = BufferedMatrix::create(2, 2, "m_", dir.path()).unwrap();
        assert!(matches!(m.append_column(), Err(BufmatError::RowsNotSet)));
    }

    #[test]
    fn append_grows_cols_and_extends_row_window() {
        let dir = tempdir().unwrap();
        let mut m = BufferedMatrix::create(2, 2, "m_", dir.path()).unwrap();
        m.set_rows(4).unwrap();
        m.set_row_mode(true).unwrap();
        let c0 = m.append_column().unwrap();
        let c1 = m.append_column().unwrap();
        assert_eq!((c0, c1), (0, 1));
        assert_eq!(m.cols(), 2);
        assert_eq!(m.row_window.as_ref().unwrap().num_columns(), 2);
    }

    #[test]
    fn appended_column_is_immediately_cache_resident() {
        let dir = tempdir().unwrap();
        let mut m = BufferedMatrix::create(2, 2, "m_", dir.path()).unwrap();
        m.set_rows(2).unwrap();
        let col = m.append_column().unwrap();
        assert!(m.cache.contains(col));
    }

    #[test]
    fn appending_past_cache_capacity_evicts_and_writes_back_oldest() {
        let dir = tempdir().unwrap();
        let mut m = BufferedMatrix::create(2, 1, "m_", dir.path()).unwrap();
        m.set_rows(2).unwrap();
        let c0 = m.append_column().unwrap();
        m.set(0, c0, 7.0).unwrap(); // only lives in the cache buffer so far
        let c1 = m.append_column().unwrap(); // evicts c0, must write it back first
        assert!(!m.cache.contains(c0));
        assert!(m.cache.contains(c1));
        assert_eq!(m.get(0, c0).unwrap(), Some(7.0));
    }

    #[test]
    fn append_rejected_when_read_only() {
        let dir = tempdir().unwrap();
        let mut m = BufferedMatrix::create(2, 2, "m_", dir.path()).unwrap();
        m.set_rows(2).unwrap();
        m.read_only = true;
        assert!(matches!(m.append_column(), Err(BufmatError::ReadOnly)));
    }
}
