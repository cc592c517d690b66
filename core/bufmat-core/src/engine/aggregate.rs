//! Cache-aware aggregation kernels (§4.9).
//!
//! Every kernel here visits columns in [`BufferedMatrix::ordered_columns`]
//! order: whatever is already resident, then the rest ascending, so a full
//! scan never touches an on-disk column more than once.
//!
//! `NaN` is the sentinel for a missing value, never `±inf`. Every reduction
//! takes an `ignore_na` flag: with `ignore_na = false`, a `NaN` anywhere in
//! the scanned range propagates to `NaN` in the result; with
//! `ignore_na = true`, `NaN`s are skipped and the count adjusted
//! accordingly. `min`/`max` additionally report whether any finite element
//! was observed — with `ignore_na = true` and nothing finite in range, the
//! numeric result is `+∞`/`-∞` and the flag is `false`.

use crate::error::BufmatResult;

use super::matrix::BufferedMatrix;

impl BufferedMatrix {
    /// Global minimum. Returns `(value, any_finite)`; `any_finite` is only
    /// meaningful when `ignore_na` is set (see module docs).
    pub fn min(&mut self, ignore_na: bool) -> BufmatResult<(f64, bool)> {
        self.extreme(ignore_na, f64::min, f64::INFINITY)
    }

    /// Global maximum. Returns `(value, any_finite)`.
    pub fn max(&mut self, ignore_na: bool) -> BufmatResult<(f64, bool)> {
        self.extreme(ignore_na, f64::max, f64::NEG_INFINITY)
    }

    pub fn sum(&mut self, ignore_na: bool) -> BufmatResult<f64> {
        let (sum, _, _) = self.sum_and_counts(ignore_na)?;
        Ok(sum)
    }

    pub fn mean(&mut self, ignore_na: bool) -> BufmatResult<f64> {
        let (sum, non_na_count, total_count) = self.sum_and_counts(ignore_na)?;
        let divisor = if ignore_na { non_na_count } else { total_count };
        Ok(if divisor == 0 { f64::NAN } else { sum / divisor as f64 })
    }

    /// Sample variance (`S / (n - 1)`), `NaN` if fewer than two values
    /// contribute.
    pub fn variance(&mut self, ignore_na: bool) -> BufmatResult<f64> {
        let mut mean = 0.0;
        let mut m2 = 0.0;
        let mut count = 0u64;
        for col in self.ordered_columns() {
            let data = self.get_column(col)?.expect("col in bounds");
            for v in data {
                if v.is_nan() {
                    if !ignore_na {
                        return Ok(f64::NAN);
                    }
                    continue;
                }
                count += 1;
                let delta = v - mean;
                mean += delta / count as f64;
                m2 += delta * (v - mean);
            }
        }
        Ok(if count < 2 { f64::NAN } else { m2 / (count - 1) as f64 })
    }

    fn extreme(
        &mut self,
        ignore_na: bool,
        combine: fn(f64, f64) -> f64,
        empty: f64,
    ) -> BufmatResult<(f64, bool)> {
        let mut result = empty;
        let mut any_finite = false;
        for col in self.ordered_columns() {
            let data = self.get_column(col)?.expect("col in bounds");
            for v in data {
                if v.is_nan() {
                    if !ignore_na {
                        return Ok((f64::NAN, any_finite));
                    }
                    continue;
                }
                any_finite = true;
                result = combine(result, v);
            }
        }
        Ok((result, any_finite))
    }

    /// `(sum, non_na_count, total_count)` over the whole matrix, in
    /// `ordered_columns` order. `sum` is left un-divided-by-anything; with
    /// `ignore_na = false` it is `NaN` as soon as the summed range contains
    /// one, by ordinary IEEE-754 propagation.
    fn sum_and_counts(&mut self, ignore_na: bool) -> BufmatResult<(f64, u64, u64)> {
        let mut sum = 0.0;
        let mut non_na_count = 0u64;
        let mut total_count = 0u64;
        for col in self.ordered_columns() {
            let data = self.get_column(col)?.expect("col in bounds");
            for v in data {
                total_count += 1;
                if v.is_nan() && ignore_na {
                    continue;
                }
                sum += v;
                if !v.is_nan() {
                    non_na_count += 1;
                }
            }
        }
        Ok((sum, non_na_count, total_count))
    }

    pub fn col_sums(&mut self, ignore_na: bool) -> BufmatResult<Vec<f64>> {
        self.per_column(ignore_na, |data, ignore_na| sum_of(data, ignore_na))
    }

    pub fn col_means(&mut self, ignore_na: bool) -> BufmatResult<Vec<f64>> {
        self.per_column(ignore_na, |data, ignore_na| mean_of(data, ignore_na))
    }

    /// Sample variance per column (`NaN` if fewer than two contribute).
    pub fn col_vars(&mut self, ignore_na: bool) -> BufmatResult<Vec<f64>> {
        self.per_column(ignore_na, |data, ignore_na| variance_of(data, ignore_na))
    }

    pub fn col_max(&mut self, ignore_na: bool) -> BufmatResult<Vec<f64>> {
        self.per_column(ignore_na, |data, ignore_na| {
            extreme_of(data, ignore_na, f64::max, f64::NEG_INFINITY)
        })
    }

    pub fn col_min(&mut self, ignore_na: bool) -> BufmatResult<Vec<f64>> {
        self.per_column(ignore_na, |data, ignore_na| {
            extreme_of(data, ignore_na, f64::min, f64::INFINITY)
        })
    }

    pub fn col_ranges(&mut self, ignore_na: bool) -> BufmatResult<Vec<f64>> {
        self.per_column(ignore_na, |data, ignore_na| {
            let max = extreme_of(data, ignore_na, f64::max, f64::NEG_INFINITY);
            let min = extreme_of(data, ignore_na, f64::min, f64::INFINITY);
            max - min
        })
    }

    pub fn col_medians(&mut self, ignore_na: bool) -> BufmatResult<Vec<f64>> {
        self.per_column(ignore_na, |data, ignore_na| median_of_slice(data, ignore_na))
    }

    /// Run `reduce` over each column's raw data (still containing any
    /// `NaN`s — `reduce` decides how to treat them), visiting columns in
    /// cache order but placing results back at their true column index.
    fn per_column(
        &mut self,
        ignore_na: bool,
        reduce: impl Fn(&[f64], bool) -> f64,
    ) -> BufmatResult<Vec<f64>> {
        let mut out = vec![f64::NAN; self.cols];
        for col in self.ordered_columns() {
            let data = self.get_column(col)?.expect("col in bounds");
            out[col] = reduce(&data, ignore_na);
        }
        Ok(out)
    }

    pub fn row_sums(&mut self, ignore_na: bool) -> BufmatResult<Vec<f64>> {
        self.row_collect(ignore_na, sum_of)
    }

    pub fn row_means(&mut self, ignore_na: bool) -> BufmatResult<Vec<f64>> {
        self.row_collect(ignore_na, mean_of)
    }

    pub fn row_vars(&mut self, ignore_na: bool) -> BufmatResult<Vec<f64>> {
        self.row_collect(ignore_na, variance_of)
    }

    pub fn row_max(&mut self, ignore_na: bool) -> BufmatResult<Vec<f64>> {
        self.row_collect(ignore_na, |data, ignore_na| {
            extreme_of(data, ignore_na, f64::max, f64::NEG_INFINITY)
        })
    }

    pub fn row_min(&mut self, ignore_na: bool) -> BufmatResult<Vec<f64>> {
        self.row_collect(ignore_na, |data, ignore_na| {
            extreme_of(data, ignore_na, f64::min, f64::INFINITY)
        })
    }

    pub fn row_medians(&mut self, ignore_na: bool) -> BufmatResult<Vec<f64>> {
        self.row_collect(ignore_na, median_of_slice)
    }

    /// Collect every row's raw data via one column-major pass, then apply
    /// `reduce` per row. Avoids the `rows`-times-reload a naive row-major
    /// walk over `get(row, col)` would cause.
    fn row_collect(
        &mut self,
        ignore_na: bool,
        reduce: impl Fn(&[f64], bool) -> f64,
    ) -> BufmatResult<Vec<f64>> {
        let rows = self.rows;
        let mut collected: Vec<Vec<f64>> = vec![Vec::new(); rows];
        for col in self.ordered_columns() {
            let data = self.get_column(col)?.expect("col in bounds");
            for (row, v) in data.into_iter().enumerate() {
                collected[row].push(v);
            }
        }
        Ok(collected
            .into_iter()
            .map(|data| reduce(&data, ignore_na))
            .collect())
    }
}

fn sum_of(data: &[f64], ignore_na: bool) -> f64 {
    let mut sum = 0.0;
    for &v in data {
        if v.is_nan() && ignore_na {
            continue;
        }
        sum += v;
    }
    sum
}

fn mean_of(data: &[f64], ignore_na: bool) -> f64 {
    let divisor = if ignore_na {
        data.iter().filter(|v| !v.is_nan()).count()
    } else {
        data.len()
    };
    if divisor == 0 {
        f64::NAN
    } else {
        sum_of(data, ignore_na) / divisor as f64
    }
}

/// Sample variance (`S / (n - 1)`) via one-pass Welford; `NaN` below two
/// contributing values, or immediately on an un-ignored `NaN`.
fn variance_of(data: &[f64], ignore_na: bool) -> f64 {
    let mut mean = 0.0;
    let mut m2 = 0.0;
    let mut count = 0u64;
    for &v in data {
        if v.is_nan() {
            if !ignore_na {
                return f64::NAN;
            }
            continue;
        }
        count += 1;
        let delta = v - mean;
        mean += delta / count as f64;
        m2 += delta * (v - mean);
    }
    if count < 2 {
        f64::NAN
    } else {
        m2 / (count - 1) as f64
    }
}

fn extreme_of(data: &[f64], ignore_na: bool, combine: fn(f64, f64) -> f64, empty: f64) -> f64 {
    let mut result = empty;
    for &v in data {
        if v.is_nan() {
            if !ignore_na {
                return f64::NAN;
            }
            continue;
        }
        result = combine(result, v);
    }
    result
}

/// Median via two `select_nth_unstable_by` partial sorts — one for the
/// even-count case's upper middle element, one for its lower. With
/// `ignore_na = false`, any `NaN` in `data` propagates.
fn median_of_slice(data: &[f64], ignore_na: bool) -> f64 {
    if !ignore_na && data.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let mut finite: Vec<f64> = data.iter().copied().filter(|v| !v.is_nan()).collect();
    let n = finite.len();
    if n == 0 {
        return f64::NAN;
    }
    let cmp = |a: &f64, b: &f64| a.partial_cmp(b).expect("NaN values were filtered out");
    let mid = n / 2;
    if n % 2 == 1 {
        let (_, median, _) = finite.select_nth_unstable_by(mid, cmp);
        *median
    } else {
        let (_, upper, _) = finite.select_nth_unstable_by(mid, cmp);
        let upper = *upper;
        let (_, lower, _) = finite.select_nth_unstable_by(mid - 1, cmp);
        (*lower + upper) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fresh(rows: usize, cols: usize) -> (tempfile::TempDir, BufferedMatrix) {
        let dir = tempdir().unwrap();
        let mut m = BufferedMatrix::create(rows.max(1), cols.max(1), "m_", dir.path()).unwrap();
        m.set_rows(rows).unwrap();
        for _ in 0..cols {
            m.append_column().unwrap();
        }
        (dir, m)
    }

    #[test]
    fn global_reductions_over_simple_matrix() {
        let (_dir, mut m) = fresh(3, 2);
        let vals = [[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        for (row, cols) in vals.iter().enumerate() {
            for (col, v) in cols.iter().enumerate() {
                m.set(row, col, *v).unwrap();
            }
        }
        assert_eq!(m.min(true).unwrap(), (1.0, true));
        assert_eq!(m.max(true).unwrap(), (6.0, true));
        assert_eq!(m.sum(true).unwrap(), 21.0);
        assert_eq!(m.mean(true).unwrap(), 3.5);
    }

    #[test]
    fn col_medians_odd_and_even() {
        let (_dir, mut m) = fresh(4, 2);
        for (row, v) in [1.0, 2.0, 3.0, 4.0].into_iter().enumerate() {
            m.set(row, 0, v).unwrap();
        }
        for (row, v) in [5.0, 1.0, 9.0, 0.0].into_iter().enumerate() {
            m.set(row, 1, v).unwrap();
        }
        let medians = m.col_medians(true).unwrap();
        assert_eq!(medians[0], 2.5);
        let mut sorted = vec![5.0, 1.0, 9.0, 0.0];
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(medians[1], (sorted[1] + sorted[2]) / 2.0);
    }

    #[test]
    fn row_medians_average_into_own_row_slot() {
        let (_dir, mut m) = fresh(2, 4);
        m.set(0, 0, 1.0).unwrap();
        m.set(0, 1, 2.0).unwrap();
        m.set(0, 2, 3.0).unwrap();
        m.set(0, 3, 4.0).unwrap();
        m.set(1, 0, 10.0).unwrap();
        m.set(1, 1, 20.0).unwrap();
        m.set(1, 2, 30.0).unwrap();
        m.set(1, 3, 40.0).unwrap();
        let medians = m.row_medians(true).unwrap();
        assert_eq!(medians[0], 2.5);
        assert_eq!(medians[1], 25.0);
    }

    #[test]
    fn ignore_na_true_skips_missing_values() {
        let (_dir, mut m) = fresh(3, 1);
        m.set(0, 0, 1.0).unwrap();
        m.set(1, 0, f64::NAN).unwrap();
        m.set(2, 0, 3.0).unwrap();
        assert_eq!(m.sum(true).unwrap(), 4.0);
        assert_eq!(m.min(true).unwrap(), (1.0, true));
    }

    #[test]
    fn ignore_na_false_propagates_nan() {
        let (_dir, mut m) = fresh(3, 1);
        m.set(0, 0, 1.0).unwrap();
        m.set(1, 0, f64::NAN).unwrap();
        m.set(2, 0, 3.0).unwrap();
        assert!(m.sum(false).unwrap().is_nan());
        assert!(m.mean(false).unwrap().is_nan());
        let (min, any_finite) = m.min(false).unwrap();
        assert!(min.is_nan());
        assert!(!any_finite);
    }

    #[test]
    fn min_max_with_no_finite_values_reports_infinity_and_flag() {
        let (_dir, mut m) = fresh(2, 1);
        m.set(0, 0, f64::NAN).unwrap();
        m.set(1, 0, f64::NAN).unwrap();
        assert_eq!(m.min(true).unwrap(), (f64::INFINITY, false));
        assert_eq!(m.max(true).unwrap(), (f64::NEG_INFINITY, false));
    }

    #[test]
    fn matrix_with_no_columns_reduces_to_nan() {
        let (_dir, mut m) = fresh(2, 0);
        assert_eq!(m.min(true).unwrap(), (f64::INFINITY, false));
        assert!(m.sum(true).unwrap() == 0.0);
        assert!(m.mean(true).unwrap().is_nan());
    }

    #[test]
    fn reduction_agreement_sum_matches_col_and_row_sums() {
        let (_dir, mut m) = fresh(3, 2);
        let vals = [[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        for (row, cols) in vals.iter().enumerate() {
            for (col, v) in cols.iter().enumerate() {
                m.set(row, col, *v).unwrap();
            }
        }
        let total = m.sum(true).unwrap();
        let col_total: f64 = m.col_sums(true).unwrap().into_iter().sum();
        let row_total: f64 = m.row_sums(true).unwrap().into_iter().sum();
        assert_eq!(total, col_total);
        assert_eq!(total, row_total);
    }
}
