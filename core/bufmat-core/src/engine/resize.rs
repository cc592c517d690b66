//! Buffer resizing (§4.7, with the capacity-sizing fix noted in the design
//! notes applied): shrinking the column cache writes back whatever falls
//! out; growing loads additional columns ascending until the new capacity
//! is reached or none remain. The `VecDeque` backing store needs no
//! intermediate fixed-size array sized to the old or new capacity.

use crate::error::{BufmatError, BufmatResult};

use super::matrix::BufferedMatrix;

impl BufferedMatrix {
    /// Change the column cache's capacity. Shrinking writes back and drops
    /// whatever columns no longer fit, oldest first. Growing scans column
    /// indices ascending and loads those not already cached, up to the new
    /// capacity or until no more columns exist.
    pub fn resize_col_buffer(&mut self, new_capacity: usize) -> BufmatResult<()> {
        if new_capacity == 0 {
            return Err(BufmatError::InvalidCapacity(
                "max_cols must be at least 1".to_string(),
            ));
        }
        let old_capacity = self.cache.capacity();
        if self.cache.len() > new_capacity {
            self.clear_clash()?;
        }
        while self.cache.len() > new_capacity {
            let evicted = self
                .cache
                .pop_oldest()
                .expect("len > new_capacity implies a resident entry");
            if !self.read_only {
                self.file_store
                    .write_whole(&self.paths[evicted.col], &evicted.data)?;
            }
        }
        self.cache.set_capacity(new_capacity);
        if new_capacity > old_capacity {
            for col in 0..self.cols {
                if self.cache.len() >= new_capacity {
                    break;
                }
                self.load_column_into_cache(col)?;
            }
        }
        tracing::debug!(new_capacity, "column cache resized");
        Ok(())
    }

    /// Change the row window's width. If row mode is currently active, the
    /// window is flushed, reallocated, and reloaded around its current
    /// anchor; otherwise only the configured width is recorded, for the
    /// next `set_row_mode(true)`.
    pub fn resize_row_buffer(&mut self, new_max_rows: usize) -> BufmatResult<()> {
        if new_max_rows == 0 {
            return Err(BufmatError::InvalidCapacity(
                "max_rows must be at least 1".to_string(),
            ));
        }
        self.row_window_width = new_max_rows;
        if let Some(window) = self.row_window.as_mut() {
            let anchor = window.first_row();
            window.flush(&self.paths, &self.file_store)?;
            let width = if self.rows > 0 {
                new_max_rows.min(self.rows)
            } else {
                new_max_rows
            };
            window.reshape(width);
            if self.rows > 0 {
                window.load_at(anchor, self.rows, &self.paths, &self.file_store, &self.cache)?;
            }
        }
        tracing::debug!(new_max_rows, "row window resized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fresh(
        max_rows: usize,
        max_cols: usize,
        rows: usize,
        cols: usize,
    ) -> (tempfile::TempDir, BufferedMatrix) {
        let dir = tempdir().unwrap();
        let mut m = BufferedMatrix::create(max_rows, max_cols, "m_", dir.path()).unwrap();
        m.set_rows(rows).unwrap();
        for _ in 0..cols {
            m.append_column().unwrap();
        }
        (dir, m)
    }

    #[test]
    fn shrinking_col_buffer_writes_back_evicted_columns() {
        let (_dir, mut m) = fresh(2, 3, 4, 3);
        m.set(0, 0, 1.0).unwrap();
        m.set(0, 1, 2.0).unwrap();
        m.set(0, 2, 3.0).unwrap();
        m.resize_col_buffer(1).unwrap();
        assert_eq!(m.get(0, 0).unwrap(), Some(1.0));
        assert_eq!(m.get(0, 1).unwrap(), Some(2.0));
        assert_eq!(m.get(0, 2).unwrap(), Some(3.0));
    }

    #[test]
    fn growing_col_buffer_loads_additional_columns_ascending() {
        let (_dir, mut m) = fresh(2, 1, 3, 3);
        assert_eq!(m.cache.len(), 1);
        m.resize_col_buffer(3).unwrap();
        assert_eq!(m.cache.len(), 3);
        assert!(m.cache.contains(0));
        assert!(m.cache.contains(1));
        assert!(m.cache.contains(2));
    }

    #[test]
    fn resize_row_buffer_preserves_values_across_reshape() {
        let (_dir, mut m) = fresh(2, 2, 6, 2);
        m.set_row_mode(true).unwrap();
        m.set(0, 0, 10.0).unwrap();
        m.set(1, 1, 20.0).unwrap();
        m.resize_row_buffer(4).unwrap();
        assert_eq!(m.max_rows(), 4);
        assert_eq!(m.get(0, 0).unwrap(), Some(10.0));
        assert_eq!(m.get(1, 1).unwrap(), Some(20.0));
    }

    #[test]
    fn rejects_zero_capacity() {
        let (_dir, mut m) = fresh(2, 2, 4, 1);
        assert!(m.resize_col_buffer(0).is_err());
        assert!(m.resize_row_buffer(0).is_err());
    }
}
