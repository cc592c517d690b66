//! Mode transitions: row/column mode, read-only, and directory moves
//! (§4.7/§4.10).

use std::path::PathBuf;

use crate::cache::RowWindow;
use crate::error::BufmatResult;

use super::matrix::BufferedMatrix;

impl BufferedMatrix {
    /// Turn row mode on or off. Turning it on builds a fresh window over
    /// every existing column, positioned at row 0. Turning it off
    /// reconciles any pending clash and flushes the window before dropping
    /// it.
    pub fn set_row_mode(&mut self, enabled: bool) -> BufmatResult<()> {
        if enabled == !self.col_mode {
            return Ok(());
        }
        if enabled {
            let width = if self.rows > 0 {
                self.row_window_width.min(self.rows)
            } else {
                self.row_window_width
            };
            let mut window = RowWindow::new(width.max(1));
            for _ in 0..self.cols {
                window.append_one_column();
            }
            if self.rows > 0 {
                window.load_at(0, self.rows, &self.paths, &self.file_store, &self.cache)?;
            }
            self.row_window = Some(window);
            self.col_mode = false;
        } else {
            self.clear_clash()?;
            if let Some(window) = self.row_window.take() {
                window.flush(&self.paths, &self.file_store)?;
            }
            self.col_mode = true;
        }
        tracing::debug!(row_mode = enabled, "mode switched");
        Ok(())
    }

    /// Flip the read-only flag. Turning it on reconciles any pending clash
    /// and flushes both caches first, so every subsequent read sees
    /// committed, consistent data with no further write-back bookkeeping.
    pub fn set_read_only(&mut self, enabled: bool) -> BufmatResult<()> {
        if enabled == self.read_only {
            return Ok(());
        }
        if enabled {
            self.clear_clash()?;
            if let Some(window) = self.row_window.as_ref() {
                window.flush(&self.paths, &self.file_store)?;
            }
            self.flush_all_cached_columns()?;
        }
        self.read_only = enabled;
        tracing::debug!(read_only = enabled, "read-only flag changed");
        Ok(())
    }

    /// Move every column file to `new_dir`, flushing both caches first.
    pub fn move_directory(&mut self, new_dir: impl Into<PathBuf>) -> BufmatResult<()> {
        let new_dir = new_dir.into();
        self.clear_clash()?;
        if let Some(window) = self.row_window.as_ref() {
            window.flush(&self.paths, &self.file_store)?;
        }
        self.flush_all_cached_columns()?;
        for path in self.paths.iter_mut() {
            *path = self.file_store.rename(path, &new_dir)?;
        }
        self.file_store.set_directory(new_dir);
        tracing::info!(directory = %self.directory().display(), "matrix directory moved");
        Ok(())
    }

    pub(crate) fn flush_all_cached_columns(&self) -> BufmatResult<()> {
        for slot in 0..self.cache.len() {
            let col = self.cache.col_at(slot);
            self.file_store.write_whole(&self.paths[col], self.cache.buf(slot))?;
        }
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
    fn row_mode_round_trip_preserves_values() {
        let (_dir, mut m) = fresh(3, 2, 5, 2);
        m.set(1, 0, 11.0).unwrap();
        m.set(4, 1, 44.0).unwrap();
        m.set_row_mode(true).unwrap();
        assert_eq!(m.get(1, 0).unwrap(), Some(11.0));
        m.set(2, 1, 22.0).unwrap();
        m.set_row_mode(false).unwrap();
        assert_eq!(m.get(2, 1).unwrap(), Some(22.0));
        assert_eq!(m.get(4, 1).unwrap(), Some(44.0));
    }

    #[test]
    fn read_only_blocks_subsequent_writes() {
        let (_dir, mut m) = fresh(2, 2, 3, 1);
        m.set_read_only(true).unwrap();
        assert!(m.set(0, 0, 1.0).is_err());
        m.set_read_only(false).unwrap();
        m.set(0, 0, 1.0).unwrap();
    }

    #[test]
    fn move_directory_relocates_files_and_preserves_data() {
        let (_dir, mut m) = fresh(2, 2, 3, 1);
        m.set(0, 0, 7.0).unwrap();
        let new_dir = tempdir().unwrap();
        m.move_directory(new_dir.path()).unwrap();
        assert_eq!(m.directory(), new_dir.path());
        assert_eq!(m.get(0, 0).unwrap(), Some(7.0));
    }
}
