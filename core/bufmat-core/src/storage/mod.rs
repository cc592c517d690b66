//! Storage module — the on-disk side of the buffered matrix.
//!
//! A [`FileStore`] owns one binary file per column: `rows` contiguous
//! little-endian `f64` values, no header. It mints file names, and performs
//! whole-column and positional-slice reads/writes. It has no notion of
//! caching or coherence — that lives in [`crate::cache`].

pub mod file_store;

pub use file_store::FileStore;
