//! In-memory caching layer: the bounded column cache, the optional row
//! window, and the clash tracker that keeps the two coherent.

pub mod clash;
pub mod column_cache;
pub mod row_window;

pub use clash::ClashTracker;
pub use column_cache::ColumnCache;
pub use row_window::RowWindow;
