//! End-to-end seed scenarios (§8): the matrix built from scratch through
//! its public surface, exercised the way a real caller would use it —
//! append columns, fill cells, read back, reduce, apply, toggle modes.

use bufmat_core::BufferedMatrix;
use tempfile::tempdir;

/// Scenario 1: rows=5, max_cols=3, append 5 columns, `A[i,j] = i + j`,
/// full readback matches.
#[test]
fn scenario_1_full_readback_of_additive_matrix() {
    let dir = tempdir().unwrap();
    let mut m = BufferedMatrix::create(5, 3, "s1_", dir.path()).unwrap();
    m.set_rows(5).unwrap();
    for _ in 0..5 {
        m.append_column().unwrap();
    }
    for i in 0..5 {
        for j in 0..5 {
            m.set(i, j, (i + j) as f64).unwrap();
        }
    }
    for i in 0..5 {
        for j in 0..5 {
            assert_eq!(m.get(i, j).unwrap(), Some((i + j) as f64));
        }
    }
}

/// Scenario 2: same matrix with max_cols=2, forcing evictions during the
/// fill; col_sums and sum still agree with the unevicted result.
#[test]
fn scenario_2_col_sums_and_sum_survive_eviction() {
    let dir = tempdir().unwrap();
    let mut m = BufferedMatrix::create(5, 2, "s2_", dir.path()).unwrap();
    m.set_rows(5).unwrap();
    for _ in 0..5 {
        m.append_column().unwrap();
    }
    for i in 0..5 {
        for j in 0..5 {
            m.set(i, j, (i + j) as f64).unwrap();
        }
    }
    assert_eq!(
        m.col_sums(false).unwrap(),
        vec![10.0, 15.0, 20.0, 25.0, 30.0]
    );
    assert_eq!(m.sum(false).unwrap(), 100.0);
}

/// Scenario 3: rows=3, 3 columns with NaNs, col_means with ignore_na true
/// and false diverge as expected.
#[test]
fn scenario_3_col_means_with_missing_values() {
    let dir = tempdir().unwrap();
    let mut m = BufferedMatrix::create(3, 3, "s3_", dir.path()).unwrap();
    m.set_rows(3).unwrap();
    for _ in 0..3 {
        m.append_column().unwrap();
    }
    m.set_column(0, &[1.0, f64::NAN, 3.0]).unwrap();
    m.set_column(1, &[f64::NAN, 5.0, 6.0]).unwrap();
    m.set_column(2, &[7.0, 8.0, 9.0]).unwrap();

    let means_ignoring = m.col_means(true).unwrap();
    assert_eq!(means_ignoring, vec![2.0, 5.5, 8.0]);

    let means_propagating = m.col_means(false).unwrap();
    assert!(means_propagating[0].is_nan());
    assert!(means_propagating[1].is_nan());
    assert_eq!(means_propagating[2], 8.0);
}

/// Scenario 4: rows=4, 2 columns, element-wise `x -> x + 1`, readback
/// matches.
#[test]
fn scenario_4_ew_apply_increments_every_cell() {
    let dir = tempdir().unwrap();
    let mut m = BufferedMatrix::create(4, 2, "s4_", dir.path()).unwrap();
    m.set_rows(4).unwrap();
    for _ in 0..2 {
        m.append_column().unwrap();
    }
    m.set_column(0, &[1.0, 2.0, 3.0, 4.0]).unwrap();
    m.set_column(1, &[5.0, 6.0, 7.0, 8.0]).unwrap();

    m.ew_apply(|v| v + 1.0).unwrap();

    assert_eq!(m.get_column(0).unwrap(), Some(vec![2.0, 3.0, 4.0, 5.0]));
    assert_eq!(m.get_column(1).unwrap(), Some(vec![6.0, 7.0, 8.0, 9.0]));
}

/// Scenario 5: read-only mode rejects writes and leaves values unchanged;
/// disabling it lets the same write through.
#[test]
fn scenario_5_read_only_blocks_then_allows_writes() {
    let dir = tempdir().unwrap();
    let mut m = BufferedMatrix::create(2, 2, "s5_", dir.path()).unwrap();
    m.set_rows(2).unwrap();
    m.append_column().unwrap();
    m.set(0, 0, 1.0).unwrap();

    m.set_read_only(true).unwrap();
    assert!(m.set(0, 0, 99.0).is_err());
    assert_eq!(m.get(0, 0).unwrap(), Some(1.0));

    m.set_read_only(false).unwrap();
    m.set(0, 0, 99.0).unwrap();
    assert_eq!(m.get(0, 0).unwrap(), Some(99.0));
}

/// Scenario 6: rows=10, max_cols=2, 10 columns, `A[i,j] = j`; row_sums is
/// ten 45s (0+1+...+9).
#[test]
fn scenario_6_row_sums_over_wide_matrix_with_small_cache() {
    let dir = tempdir().unwrap();
    let mut m = BufferedMatrix::create(10, 2, "s6_", dir.path()).unwrap();
    m.set_rows(10).unwrap();
    for _ in 0..10 {
        m.append_column().unwrap();
    }
    for i in 0..10 {
        for j in 0..10 {
            m.set(i, j, j as f64).unwrap();
        }
    }
    assert_eq!(m.row_sums(false).unwrap(), vec![45.0; 10]);
}
