//! # bufmat-core — out-of-core dual-buffer cached matrix engine
//!
//! A 2-D `f64` matrix too large to keep fully resident, persisted one file
//! per column. A bounded column cache holds the most recently loaded
//! columns; an optional contiguous row window can additionally be turned
//! on for workloads that sweep rows instead of columns. The two caches are
//! kept coherent by a single-slot clash tracker, reconciled lazily.
//!
//! ## Quick Start
//!
//! ```rust
//! use bufmat_core::BufferedMatrix;
//!
//! # fn main() -> bufmat_core::BufmatResult<()> {
//! let dir = tempfile::tempdir().unwrap();
//! let mut m = BufferedMatrix::create(4, 8, "demo_", dir.path())?;
//! m.set_rows(100)?;
//! m.append_column()?;
//! m.set(0, 0, 3.5)?;
//! assert_eq!(m.get(0, 0)?, Some(3.5));
//! assert_eq!(m.sum(true)?, 3.5);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//! - [`storage`] — per-column file I/O ([`storage::FileStore`])
//! - [`cache`] — the column cache, row window, and clash tracker
//! - [`engine`] — orchestration ([`BufferedMatrix`])
//! - [`error`] — [`BufmatError`] / [`BufmatResult`]
//! - [`logging`] — optional `tracing` initialization, behind the `logging`
//!   feature

pub mod cache;
pub mod engine;
pub mod error;
pub mod logging;
pub mod storage;

pub use engine::BufferedMatrix;
pub use error::{BufmatError, BufmatResult};
