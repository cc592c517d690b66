//! Element-wise apply (§4.9).

use crate::error::{BufmatError, BufmatResult};

use super::matrix::BufferedMatrix;

impl BufferedMatrix {
    /// Replace every cell with `f(cell)`, scanning columns in cache order.
    pub fn ew_apply(&mut self, f: impl Fn(f64) -> f64) -> BufmatResult<()> {
        if self.read_only {
            return Err(BufmatError::ReadOnly);
        }
        for col in self.ordered_columns() {
            for row in 0..self.rows {
                let v = self
                    .get(row, col)?
                    .expect("row < rows and col < cols were just checked");
                self.set(row, col, f(v))?;
            }
        }
        Ok(())
    }
}
