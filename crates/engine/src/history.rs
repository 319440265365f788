//! Bounded per-symbol history of valid comparisons.

use compact_str::CompactString;
use dashmap::DashMap;
use spread_core::{normalize_symbol, HistoryRecord};
use std::collections::VecDeque;

/// Fixed-capacity FIFO: pushing onto a full buffer evicts the oldest item.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Create an empty buffer. Capacity is clamped to at least one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append at the tail, returning the evicted head if the buffer was full.
    pub fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.len() == self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(item);
        evicted
    }

    /// Up to `limit` most recent items, oldest first.
    pub fn latest(&self, limit: usize) -> impl Iterator<Item = &T> {
        let skip = self.items.len().saturating_sub(limit);
        self.items.iter().skip(skip)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Map from symbol to a fixed-capacity ring of [`HistoryRecord`]s.
///
/// Rings are created on the first append for a symbol. Appends to the same
/// symbol are serialized by the map's shard lock, so the capacity bound holds
/// under concurrent writers.
#[derive(Debug)]
pub struct HistoryStore {
    capacity: usize,
    sequences: DashMap<CompactString, RingBuffer<HistoryRecord>>,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            sequences: DashMap::new(),
        }
    }

    /// Append `record` to the tail of `symbol`'s sequence.
    pub fn append(&self, symbol: &str, record: HistoryRecord) {
        let mut ring = self
            .sequences
            .entry(normalize_symbol(symbol))
            .or_insert_with(|| RingBuffer::new(self.capacity));
        ring.push(record);
    }

    /// Up to `limit` most recent records, newest last. Unknown symbols yield
    /// an empty list.
    pub fn read(&self, symbol: &str, limit: usize) -> Vec<HistoryRecord> {
        self.sequences
            .get(&normalize_symbol(symbol))
            .map(|ring| ring.latest(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Number of records held for `symbol`.
    pub fn len(&self, symbol: &str) -> usize {
        self.sequences
            .get(&normalize_symbol(symbol))
            .map(|ring| ring.len())
            .unwrap_or(0)
    }

    /// Symbols with at least one record, sorted.
    pub fn symbols(&self) -> Vec<CompactString> {
        let mut symbols: Vec<CompactString> =
            self.sequences.iter().map(|r| r.key().clone()).collect();
        symbols.sort();
        symbols
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(crate::HISTORY_CAPACITY)
    }
}
