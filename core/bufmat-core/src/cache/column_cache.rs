//! Bounded column cache — strict FIFO-by-insertion, not touch-based LRU.
//!
//! Position 0 (the front of the deque) is always the eviction victim; the
//! back is the most-recently-loaded column. `locate` never promotes an
//! entry — only eviction and append change order. This matches the access
//! pattern the engine is tuned for (full sweeps, sequential scans), where a
//! touch-based LRU buys nothing over simple insertion order.

use std::collections::VecDeque;

/// One resident column: its index in the matrix and its `rows`-long buffer.
pub struct CacheEntry {
    pub col: usize,
    pub data: Vec<f64>,
}

/// Bounded, FIFO-by-insertion pool of fully-resident columns.
pub struct ColumnCache {
    entries: VecDeque<CacheEntry>,
    capacity: usize,
}

impl ColumnCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the advertised capacity. Does not evict or grow by itself —
    /// the engine's resize path (`resize_col_buffer`) drives entry movement
    /// explicitly so it can write back evicted columns.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Find the resident slot index holding `col`, without changing order.
    pub fn locate(&self, col: usize) -> Option<usize> {
        self.entries.iter().position(|e| e.col == col)
    }

    pub fn contains(&self, col: usize) -> bool {
        self.locate(col).is_some()
    }

    pub fn col_at(&self, slot: usize) -> usize {
        self.entries[slot].col
    }

    pub fn buf(&self, slot: usize) -> &[f64] {
        &self.entries[slot].data
    }

    pub fn buf_mut(&mut self, slot: usize) -> &mut [f64] {
        &mut self.entries[slot].data
    }

    /// Columns currently resident, oldest first — the order the cache-aware
    /// scans in §4.9/§4.8 visit before falling back to on-disk columns.
    pub fn resident_columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|e| e.col)
    }

    /// Append a brand-new entry as the most-recently-loaded slot. Caller is
    /// responsible for checking `is_full()` first.
    pub fn push_new(&mut self, col: usize, data: Vec<f64>) {
        debug_assert!(!self.contains(col), "column {col} already cached");
        self.entries.push_back(CacheEntry { col, data });
    }

    /// Remove and return the oldest entry (position 0), shifting the rest
    /// down by one. The returned entry's `data` allocation is meant to be
    /// reused for the incoming column rather than dropped.
    pub fn pop_oldest(&mut self) -> Option<CacheEntry> {
        self.entries.pop_front()
    }

    /// Reinsert a (possibly reused) entry as the most-recently-loaded slot.
    pub fn push_back_entry(&mut self, entry: CacheEntry) {
        debug_assert!(!self.contains(entry.col), "column {} already cached", entry.col);
        self.entries.push_back(entry);
    }

    /// Remove a specific column's entry, wherever it sits. Used by the
    /// shrinking half of `resize_col_buffer`.
    pub fn remove(&mut self, col: usize) -> Option<CacheEntry> {
        let idx = self.locate(col)?;
        self.entries.remove(idx)
    }
}
