//! Error types for the buffered matrix engine.
//!
//! All public APIs return `BufmatResult<T>` — no panics in library code.

use thiserror::Error;

/// Unified error type for all engine operations.
#[derive(Debug, Error)]
pub enum BufmatError {
    /// Standard I/O error (open, seek, rename, delete).
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// A file read returned fewer bytes than the column layout requires.
    #[error("short read on column file: expected {expected} bytes, got {actual}")]
    ShortRead { expected: usize, actual: usize },

    /// A file write persisted fewer bytes than requested.
    #[error("short write on column file: expected {expected} bytes, wrote {actual}")]
    ShortWrite { expected: usize, actual: usize },

    /// `set_rows` called a second time.
    #[error("row count is already set to {current} and cannot be changed")]
    RowsAlreadySet { current: usize },

    /// An operation that requires a fixed row count was attempted before `set_rows`.
    #[error("row count has not been set yet")]
    RowsNotSet,

    /// A mutating operation was attempted while the matrix is read-only.
    #[error("matrix is read-only")]
    ReadOnly,

    /// A buffer capacity argument was not positive, or otherwise invalid.
    #[error("invalid capacity: {0}")]
    InvalidCapacity(String),

    /// Two matrices did not have matching dimensions for a bulk operation.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// An index array passed to a bulk operation contained an out-of-range entry.
    #[error("invalid index list: {0}")]
    InvalidIndices(String),
}

/// Result type alias for all engine operations.
pub type BufmatResult<T> = Result<T, BufmatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_read_only() {
        let err = BufmatError::ReadOnly;
        assert_eq!(err.to_string(), "matrix is read-only");
    }

    #[test]
    fn error_display_rows_already_set() {
        let err = BufmatError::RowsAlreadySet { current: 10 };
        assert!(err.to_string().contains("already set to 10"));
    }

    #[test]
    fn bufmat_result_ok() {
        let result: BufmatResult<i32> = Ok(42);
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn bufmat_result_err() {
        let result: BufmatResult<i32> = Err(BufmatError::RowsNotSet);
        assert!(result.is_err());
    }
}
