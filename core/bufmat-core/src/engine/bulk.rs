//! Bulk row/column access and whole-matrix copy (§4.8).

use crate::error::{BufmatError, BufmatResult};

use super::matrix::BufferedMatrix;

impl BufferedMatrix {
    /// Every value in `col`, read through the same cache path as [`Self::get`].
    pub fn get_column(&mut self, col: usize) -> BufmatResult<Option<Vec<f64>>> {
        if col >= self.cols {
            return Ok(None);
        }
        let mut out = Vec::with_capacity(self.rows);
        for row in 0..self.rows {
            out.push(
                self.get(row, col)?
                    .expect("row < rows and col < cols were just checked"),
            );
        }
        Ok(Some(out))
    }

    pub fn set_column(&mut self, col: usize, values: &[f64]) -> BufmatResult<()> {
        if col >= self.cols {
            return Ok(());
        }
        if values.len() != self.rows {
            return Err(BufmatError::DimensionMismatch(format!(
                "column has {} rows, got {} values",
                self.rows,
                values.len()
            )));
        }
        for (row, &v) in values.iter().enumerate() {
            self.set(row, col, v)?;
        }
        Ok(())
    }

    /// Every value in `row`, in cache-friendly column order, placed back at
    /// each column's true index.
    pub fn get_row(&mut self, row: usize) -> BufmatResult<Option<Vec<f64>>> {
        if row >= self.rows {
            return Ok(None);
        }
        let mut out = vec![0.0; self.cols];
        for col in self.ordered_columns() {
            out[col] = self
                .get(row, col)?
                .expect("row < rows and col < cols were just checked");
        }
        Ok(Some(out))
    }

    pub fn set_row(&mut self, row: usize, values: &[f64]) -> BufmatResult<()> {
        if row >= self.rows {
            return Ok(());
        }
        if values.len() != self.cols {
            return Err(BufmatError::DimensionMismatch(format!(
                "row has {} columns, got {} values",
                self.cols,
                values.len()
            )));
        }
        for col in self.ordered_columns() {
            self.set(row, col, values[col])?;
        }
        Ok(())
    }

    /// Every value of each requested column, column-major (`rows * indices.len()`).
    /// In row mode this falls through to per-cell [`Self::get`]; in column
    /// mode each requested column is loaded (or read straight from the
    /// cache) through the same path as [`Self::get_column`].
    pub fn get_columns(&mut self, indices: &[usize]) -> BufmatResult<Vec<f64>> {
        for &col in indices {
            if col >= self.cols {
                return Err(BufmatError::InvalidIndices(format!(
                    "column index {col} out of range for {} columns",
                    self.cols
                )));
            }
        }
        let mut out = Vec::with_capacity(self.rows * indices.len());
        for &col in indices {
            let data = self.get_column(col)?.expect("col in bounds was just checked");
            out.extend(data);
        }
        Ok(out)
    }

    /// Symmetric with [`Self::get_columns`]; `values` is column-major
    /// (`rows * indices.len()`). Out-of-range indices fail the whole call.
    pub fn set_columns(&mut self, indices: &[usize], values: &[f64]) -> BufmatResult<()> {
        if self.read_only {
            return Err(BufmatError::ReadOnly);
        }
        for &col in indices {
            if col >= self.cols {
                return Err(BufmatError::InvalidIndices(format!(
                    "column index {col} out of range for {} columns",
                    self.cols
                )));
            }
        }
        if values.len() != indices.len() * self.rows {
            return Err(BufmatError::DimensionMismatch(format!(
                "expected {} values ({} columns x {} rows), got {}",
                indices.len() * self.rows,
                indices.len(),
                self.rows,
                values.len()
            )));
        }
        for (k, &col) in indices.iter().enumerate() {
            let slice = &values[k * self.rows..(k + 1) * self.rows];
            self.set_column(col, slice)?;
        }
        Ok(())
    }

    /// Every value of each requested row, row-major (`indices.len() * cols`).
    /// In row mode, iterates per cell. In column mode, one pass over
    /// [`Self::ordered_columns`] extracts all requested rows from each
    /// column — every on-disk column is touched at most once regardless of
    /// how many rows are requested.
    pub fn get_rows_by_index(&mut self, indices: &[usize]) -> BufmatResult<Vec<f64>> {
        for &row in indices {
            if row >= self.rows {
                return Err(BufmatError::InvalidIndices(format!(
                    "row index {row} out of range for {} rows",
                    self.rows
                )));
            }
        }
        let cols = self.cols;
        let mut out = vec![0.0; indices.len() * cols];
        if self.col_mode {
            for col in self.ordered_columns() {
                let data = self.get_column(col)?.expect("col in bounds");
                for (k, &row) in indices.iter().enumerate() {
                    out[k * cols + col] = data[row];
                }
            }
        } else {
            for (k, &row) in indices.iter().enumerate() {
                for col in 0..cols {
                    out[k * cols + col] = self
                        .get(row, col)?
                        .expect("row < rows and col < cols were just checked");
                }
            }
        }
        Ok(out)
    }

    /// Symmetric with [`Self::get_rows_by_index`]; `values` is row-major
    /// (`indices.len() * cols`). Out-of-range indices fail the whole call.
    pub fn set_rows_by_index(&mut self, indices: &[usize], values: &[f64]) -> BufmatResult<()> {
        if self.read_only {
            return Err(BufmatError::ReadOnly);
        }
        for &row in indices {
            if row >= self.rows {
                return Err(BufmatError::InvalidIndices(format!(
                    "row index {row} out of range for {} rows",
                    self.rows
                )));
            }
        }
        if values.len() != indices.len() * self.cols {
            return Err(BufmatError::DimensionMismatch(format!(
                "expected {} values ({} rows x {} columns), got {}",
                indices.len() * self.cols,
                indices.len(),
                self.cols,
                values.len()
            )));
        }
        for (k, &row) in indices.iter().enumerate() {
            let slice = &values[k * self.cols..(k + 1) * self.cols];
            self.set_row(row, slice)?;
        }
        Ok(())
    }

    /// Copy every value from `src` into `self`. Both matrices must share
    /// the same dimensions; `src`'s own cache order drives the scan.
    pub fn copy_values(&mut self, src: &mut BufferedMatrix) -> BufmatResult<()> {
        if self.read_only {
            return Err(BufmatError::ReadOnly);
        }
        if self.rows != src.rows || self.cols != src.cols {
            return Err(BufmatError::DimensionMismatch(format!(
                "destination is {}x{}, source is {}x{}",
                self.rows, self.cols, src.rows, src.cols
            )));
        }
        for col in src.ordered_columns() {
            let values = src
                .get_column(col)?
                .expect("col < cols was just checked on src");
            self.set_column(col, &values)?;
        }
        Ok(())
    }
}
