//! C FFI bindings for the buffered matrix engine.
//!
//! Every function takes an opaque [`BufmatHandle`] pointer and returns a
//! `BUFMAT_*` status code (0 on success). Vector-returning operations write
//! into a caller-supplied buffer rather than allocating, except where the
//! result's length is statically unknown to the caller (none here — every
//! buffer is sized `rows` or `cols`, both queryable up front).

#![allow(unsafe_op_in_unsafe_fn)]

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::path::PathBuf;
use std::ptr;
use std::slice;

use bufmat_core::{BufferedMatrix, BufmatError};

/// Opaque handle to a matrix instance.
#[repr(C)]
pub struct BufmatHandle {
    matrix: BufferedMatrix,
}

pub const BUFMAT_OK: c_int = 0;
pub const BUFMAT_ERR_NULL_PTR: c_int = -1;
pub const BUFMAT_ERR_INVALID_UTF8: c_int = -2;
pub const BUFMAT_ERR_ENGINE: c_int = -3;
pub const BUFMAT_ERR_READ_ONLY: c_int = -4;
pub const BUFMAT_ERR_BUFFER_TOO_SMALL: c_int = -5;

fn map_err(err: BufmatError) -> c_int {
    match err {
        BufmatError::ReadOnly => BUFMAT_ERR_READ_ONLY,
        _ => BUFMAT_ERR_ENGINE,
    }
}

unsafe fn cstr_to_str<'a>(ptr: *const c_char) -> Result<&'a str, c_int> {
    CStr::from_ptr(ptr).to_str().map_err(|_| BUFMAT_ERR_INVALID_UTF8)
}

/// Create a matrix of the given buffer capacities, rooted at `directory`
/// with file names minted as `{prefix}{suffix}.bmx`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_create(
    max_rows: usize,
    max_cols: usize,
    prefix: *const c_char,
    directory: *const c_char,
) -> *mut BufmatHandle {
    if prefix.is_null() || directory.is_null() {
        return ptr::null_mut();
    }
    let prefix = match cstr_to_str(prefix) {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };
    let directory = match cstr_to_str(directory) {
        Ok(s) => s,
        Err(_) => return ptr::null_mut(),
    };
    match BufferedMatrix::create(max_rows, max_cols, prefix, PathBuf::from(directory)) {
        Ok(matrix) => Box::into_raw(Box::new(BufmatHandle { matrix })),
        Err(_) => ptr::null_mut(),
    }
}

/// Destroy a matrix, deleting its owned column files.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_destroy(handle: *mut BufmatHandle) {
    if !handle.is_null() {
        let _ = Box::from_raw(handle);
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_set_rows(handle: *mut BufmatHandle, rows: usize) -> c_int {
    if handle.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    match (*handle).matrix.set_rows(rows) {
        Ok(()) => BUFMAT_OK,
        Err(e) => map_err(e),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_rows(handle: *const BufmatHandle) -> usize {
    if handle.is_null() {
        return 0;
    }
    (*handle).matrix.rows()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_cols(handle: *const BufmatHandle) -> usize {
    if handle.is_null() {
        return 0;
    }
    (*handle).matrix.cols()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_max_rows(handle: *const BufmatHandle) -> usize {
    if handle.is_null() {
        return 0;
    }
    (*handle).matrix.max_rows()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_max_cols(handle: *const BufmatHandle) -> usize {
    if handle.is_null() {
        return 0;
    }
    (*handle).matrix.max_cols()
}

/// Append a zero-filled column. Writes its index to `out_col`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_append_column(
    handle: *mut BufmatHandle,
    out_col: *mut usize,
) -> c_int {
    if handle.is_null() || out_col.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    match (*handle).matrix.append_column() {
        Ok(col) => {
            *out_col = col;
            BUFMAT_OK
        }
        Err(e) => map_err(e),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_resize_col_buffer(
    handle: *mut BufmatHandle,
    new_capacity: usize,
) -> c_int {
    if handle.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    match (*handle).matrix.resize_col_buffer(new_capacity) {
        Ok(()) => BUFMAT_OK,
        Err(e) => map_err(e),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_resize_row_buffer(
    handle: *mut BufmatHandle,
    new_max_rows: usize,
) -> c_int {
    if handle.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    match (*handle).matrix.resize_row_buffer(new_max_rows) {
        Ok(()) => BUFMAT_OK,
        Err(e) => map_err(e),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_set_row_mode(handle: *mut BufmatHandle, enabled: c_int) -> c_int {
    if handle.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    match (*handle).matrix.set_row_mode(enabled != 0) {
        Ok(()) => BUFMAT_OK,
        Err(e) => map_err(e),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_is_row_mode(handle: *const BufmatHandle) -> c_int {
    if handle.is_null() {
        return 0;
    }
    (*handle).matrix.is_row_mode() as c_int
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_set_read_only(handle: *mut BufmatHandle, enabled: c_int) -> c_int {
    if handle.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    match (*handle).matrix.set_read_only(enabled != 0) {
        Ok(()) => BUFMAT_OK,
        Err(e) => map_err(e),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_is_read_only(handle: *const BufmatHandle) -> c_int {
    if handle.is_null() {
        return 0;
    }
    (*handle).matrix.is_read_only() as c_int
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_set_prefix(
    handle: *mut BufmatHandle,
    prefix: *const c_char,
) -> c_int {
    if handle.is_null() || prefix.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    let prefix = match cstr_to_str(prefix) {
        Ok(s) => s,
        Err(code) => return code,
    };
    (*handle).matrix.set_prefix(prefix);
    BUFMAT_OK
}

/// Copy the current prefix into `out_buf` (size `buf_len`), NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_get_prefix(
    handle: *const BufmatHandle,
    out_buf: *mut c_char,
    buf_len: usize,
) -> c_int {
    let prefix = match handle.as_ref() {
        Some(h) => h.matrix.prefix(),
        None => return BUFMAT_ERR_NULL_PTR,
    };
    copy_str_out(prefix, out_buf, buf_len).unwrap_or(BUFMAT_ERR_NULL_PTR)
}

/// Copy the current directory into `out_buf` (size `buf_len`), NUL-terminated.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_get_directory(
    handle: *const BufmatHandle,
    out_buf: *mut c_char,
    buf_len: usize,
) -> c_int {
    let directory = match handle.as_ref() {
        Some(h) => h.matrix.directory().to_string_lossy().into_owned(),
        None => return BUFMAT_ERR_NULL_PTR,
    };
    copy_str_out(&directory, out_buf, buf_len).unwrap_or(BUFMAT_ERR_NULL_PTR)
}

fn copy_str_out(s: &str, out_buf: *mut c_char, buf_len: usize) -> Option<c_int> {
    if out_buf.is_null() {
        return None;
    }
    let c_string = CString::new(s).ok()?;
    let bytes = c_string.as_bytes_with_nul();
    if bytes.len() > buf_len {
        return Some(BUFMAT_ERR_BUFFER_TOO_SMALL);
    }
    unsafe {
        ptr::copy_nonoverlapping(bytes.as_ptr() as *const c_char, out_buf, bytes.len());
    }
    Some(BUFMAT_OK)
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_move_directory(
    handle: *mut BufmatHandle,
    new_dir: *const c_char,
) -> c_int {
    if handle.is_null() || new_dir.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    let new_dir = match cstr_to_str(new_dir) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match (*handle).matrix.move_directory(PathBuf::from(new_dir)) {
        Ok(()) => BUFMAT_OK,
        Err(e) => map_err(e),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_get(
    handle: *mut BufmatHandle,
    row: usize,
    col: usize,
    out_value: *mut f64,
    out_present: *mut c_int,
) -> c_int {
    if handle.is_null() || out_value.is_null() || out_present.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    match (*handle).matrix.get(row, col) {
        Ok(Some(v)) => {
            *out_value = v;
            *out_present = 1;
            BUFMAT_OK
        }
        Ok(None) => {
            *out_present = 0;
            BUFMAT_OK
        }
        Err(e) => map_err(e),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_set(
    handle: *mut BufmatHandle,
    row: usize,
    col: usize,
    value: f64,
) -> c_int {
    if handle.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    match (*handle).matrix.set(row, col, value) {
        Ok(_) => BUFMAT_OK,
        Err(e) => map_err(e),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_get_single_index(
    handle: *mut BufmatHandle,
    index: usize,
    out_value: *mut f64,
    out_present: *mut c_int,
) -> c_int {
    if handle.is_null() || out_value.is_null() || out_present.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    match (*handle).matrix.get_single_index(index) {
        Ok(Some(v)) => {
            *out_value = v;
            *out_present = 1;
            BUFMAT_OK
        }
        Ok(None) => {
            *out_present = 0;
            BUFMAT_OK
        }
        Err(e) => map_err(e),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_set_single_index(
    handle: *mut BufmatHandle,
    index: usize,
    value: f64,
) -> c_int {
    if handle.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    match (*handle).matrix.set_single_index(index, value) {
        Ok(_) => BUFMAT_OK,
        Err(e) => map_err(e),
    }
}

/// Read column `col` into `out_buf`, which must hold exactly `rows()` values.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_get_column(
    handle: *mut BufmatHandle,
    col: usize,
    out_buf: *mut f64,
    buf_len: usize,
) -> c_int {
    if handle.is_null() || out_buf.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    match (*handle).matrix.get_column(col) {
        Ok(Some(values)) => {
            if values.len() != buf_len {
                return BUFMAT_ERR_BUFFER_TOO_SMALL;
            }
            slice::from_raw_parts_mut(out_buf, buf_len).copy_from_slice(&values);
            BUFMAT_OK
        }
        Ok(None) => BUFMAT_ERR_ENGINE,
        Err(e) => map_err(e),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_set_column(
    handle: *mut BufmatHandle,
    col: usize,
    values: *const f64,
    len: usize,
) -> c_int {
    if handle.is_null() || values.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    let values = slice::from_raw_parts(values, len);
    match (*handle).matrix.set_column(col, values) {
        Ok(()) => BUFMAT_OK,
        Err(e) => map_err(e),
    }
}

/// Read row `row` into `out_buf`, which must hold exactly `cols()` values.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_get_row(
    handle: *mut BufmatHandle,
    row: usize,
    out_buf: *mut f64,
    buf_len: usize,
) -> c_int {
    if handle.is_null() || out_buf.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    match (*handle).matrix.get_row(row) {
        Ok(Some(values)) => {
            if values.len() != buf_len {
                return BUFMAT_ERR_BUFFER_TOO_SMALL;
            }
            slice::from_raw_parts_mut(out_buf, buf_len).copy_from_slice(&values);
            BUFMAT_OK
        }
        Ok(None) => BUFMAT_ERR_ENGINE,
        Err(e) => map_err(e),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_set_row(
    handle: *mut BufmatHandle,
    row: usize,
    values: *const f64,
    len: usize,
) -> c_int {
    if handle.is_null() || values.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    let values = slice::from_raw_parts(values, len);
    match (*handle).matrix.set_row(row, values) {
        Ok(()) => BUFMAT_OK,
        Err(e) => map_err(e),
    }
}

/// Read the columns named by `cols` (length `num_cols`) into `out_buf`,
/// column-major (`rows() * num_cols` values).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_get_columns(
    handle: *mut BufmatHandle,
    cols: *const usize,
    num_cols: usize,
    out_buf: *mut f64,
    buf_len: usize,
) -> c_int {
    if handle.is_null() || cols.is_null() || out_buf.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    let cols = slice::from_raw_parts(cols, num_cols);
    match (*handle).matrix.get_columns(cols) {
        Ok(values) => {
            if values.len() != buf_len {
                return BUFMAT_ERR_BUFFER_TOO_SMALL;
            }
            slice::from_raw_parts_mut(out_buf, buf_len).copy_from_slice(&values);
            BUFMAT_OK
        }
        Err(e) => map_err(e),
    }
}

/// Symmetric with [`bufmat_get_columns`]; `values` is column-major
/// (`rows() * num_cols`).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_set_columns(
    handle: *mut BufmatHandle,
    cols: *const usize,
    num_cols: usize,
    values: *const f64,
    len: usize,
) -> c_int {
    if handle.is_null() || cols.is_null() || values.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    let cols = slice::from_raw_parts(cols, num_cols);
    let values = slice::from_raw_parts(values, len);
    match (*handle).matrix.set_columns(cols, values) {
        Ok(()) => BUFMAT_OK,
        Err(e) => map_err(e),
    }
}

/// Read the rows named by `rows` (length `num_rows`) into `out_buf`,
/// row-major (`num_rows * cols()` values).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_get_rows(
    handle: *mut BufmatHandle,
    rows: *const usize,
    num_rows: usize,
    out_buf: *mut f64,
    buf_len: usize,
) -> c_int {
    if handle.is_null() || rows.is_null() || out_buf.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    let rows = slice::from_raw_parts(rows, num_rows);
    match (*handle).matrix.get_rows_by_index(rows) {
        Ok(values) => {
            if values.len() != buf_len {
                return BUFMAT_ERR_BUFFER_TOO_SMALL;
            }
            slice::from_raw_parts_mut(out_buf, buf_len).copy_from_slice(&values);
            BUFMAT_OK
        }
        Err(e) => map_err(e),
    }
}

/// Symmetric with [`bufmat_get_rows`]; `values` is row-major
/// (`num_rows * cols()`). Named distinctly from `bufmat_set_rows` (which
/// fixes the matrix's row count) to avoid colliding with it.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_set_rows_by_index(
    handle: *mut BufmatHandle,
    rows: *const usize,
    num_rows: usize,
    values: *const f64,
    len: usize,
) -> c_int {
    if handle.is_null() || rows.is_null() || values.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    let rows = slice::from_raw_parts(rows, num_rows);
    let values = slice::from_raw_parts(values, len);
    match (*handle).matrix.set_rows_by_index(rows, values) {
        Ok(()) => BUFMAT_OK,
        Err(e) => map_err(e),
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_copy_values(
    dst: *mut BufmatHandle,
    src: *mut BufmatHandle,
) -> c_int {
    if dst.is_null() || src.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    match (*dst).matrix.copy_values(&mut (*src).matrix) {
        Ok(()) => BUFMAT_OK,
        Err(e) => map_err(e),
    }
}

/// C function pointer used by [`bufmat_ew_apply`].
pub type BufmatApplyFn = extern "C" fn(f64) -> f64;

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_ew_apply(handle: *mut BufmatHandle, f: BufmatApplyFn) -> c_int {
    if handle.is_null() {
        return BUFMAT_ERR_NULL_PTR;
    }
    match (*handle).matrix.ew_apply(|v| f(v)) {
        Ok(()) => BUFMAT_OK,
        Err(e) => map_err(e),
    }
}

/// `min`/`max` additionally report, via `out_any_finite`, whether any
/// non-`NaN` element was observed (only meaningful when `ignore_na` is
/// set — see `bufmat-core`'s aggregate module docs).
macro_rules! extreme_reduction {
    ($name:ident, $method:ident) => {
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(
            handle: *mut BufmatHandle,
            ignore_na: c_int,
            out_value: *mut f64,
            out_any_finite: *mut c_int,
        ) -> c_int {
            if handle.is_null() || out_value.is_null() || out_any_finite.is_null() {
                return BUFMAT_ERR_NULL_PTR;
            }
            match (*handle).matrix.$method(ignore_na != 0) {
                Ok((v, any_finite)) => {
                    *out_value = v;
                    *out_any_finite = any_finite as c_int;
                    BUFMAT_OK
                }
                Err(e) => map_err(e),
            }
        }
    };
}

extreme_reduction!(bufmat_min, min);
extreme_reduction!(bufmat_max, max);

macro_rules! scalar_reduction {
    ($name:ident, $method:ident) => {
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(
            handle: *mut BufmatHandle,
            ignore_na: c_int,
            out_value: *mut f64,
        ) -> c_int {
            if handle.is_null() || out_value.is_null() {
                return BUFMAT_ERR_NULL_PTR;
            }
            match (*handle).matrix.$method(ignore_na != 0) {
                Ok(v) => {
                    *out_value = v;
                    BUFMAT_OK
                }
                Err(e) => map_err(e),
            }
        }
    };
}

scalar_reduction!(bufmat_sum, sum);
scalar_reduction!(bufmat_mean, mean);
scalar_reduction!(bufmat_variance, variance);

macro_rules! vector_reduction {
    ($name:ident, $method:ident) => {
        /// Writes one value per entry into `out_values` (`NaN` sentinel
        /// for a missing result), sized to the reduction's natural length.
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn $name(
            handle: *mut BufmatHandle,
            ignore_na: c_int,
            out_values: *mut f64,
            len: usize,
        ) -> c_int {
            if handle.is_null() || out_values.is_null() {
                return BUFMAT_ERR_NULL_PTR;
            }
            match (*handle).matrix.$method(ignore_na != 0) {
                Ok(values) => {
                    if values.len() != len {
                        return BUFMAT_ERR_BUFFER_TOO_SMALL;
                    }
                    slice::from_raw_parts_mut(out_values, len).copy_from_slice(&values);
                    BUFMAT_OK
                }
                Err(e) => map_err(e),
            }
        }
    };
}

vector_reduction!(bufmat_col_sums, col_sums);
vector_reduction!(bufmat_col_means, col_means);
vector_reduction!(bufmat_col_vars, col_vars);
vector_reduction!(bufmat_col_max, col_max);
vector_reduction!(bufmat_col_min, col_min);
vector_reduction!(bufmat_col_medians, col_medians);
vector_reduction!(bufmat_col_ranges, col_ranges);
vector_reduction!(bufmat_row_sums, row_sums);
vector_reduction!(bufmat_row_means, row_means);
vector_reduction!(bufmat_row_vars, row_vars);
vector_reduction!(bufmat_row_max, row_max);
vector_reduction!(bufmat_row_min, row_min);
vector_reduction!(bufmat_row_medians, row_medians);

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_memory_in_use(handle: *const BufmatHandle) -> usize {
    if handle.is_null() {
        return 0;
    }
    (*handle).matrix.memory_in_use()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn bufmat_file_space_in_use(handle: *const BufmatHandle) -> usize {
    if handle.is_null() {
        return 0;
    }
    (*handle).matrix.file_space_in_use()
}
