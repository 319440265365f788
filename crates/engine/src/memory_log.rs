//! In-process comparison log, used when no database is configured.

use async_trait::async_trait;
use spread_core::{normalize_symbol, now_utc, ComparisonLog, ComparisonResult, LogError, PersistedEntry};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct Entries {
    entries: VecDeque<PersistedEntry>,
    last_id: i64,
}

/// Append-only log held in memory.
///
/// Unbounded by default, which suits tests and short runs. Long-running
/// processes should use [`MemoryLog::bounded`]; ids keep increasing after
/// the oldest entries are dropped.
#[derive(Debug)]
pub struct MemoryLog {
    inner: Mutex<Entries>,
    capacity: Option<usize>,
    available: AtomicBool,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Entries::default()),
            capacity: None,
            available: AtomicBool::new(true),
        }
    }

    /// Keep at most `capacity` entries, dropping the oldest first.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::new()
        }
    }

    /// Simulate storage going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entries.is_empty()
    }
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComparisonLog for MemoryLog {
    async fn append(&self, result: &ComparisonResult) -> Result<i64, LogError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(LogError::PersistenceFailed("storage unavailable".to_string()));
        }

        // Id assignment and push happen under one lock.
        let mut inner = self.inner.lock().await;
        inner.last_id += 1;
        let id = inner.last_id;
        inner
            .entries
            .push_back(PersistedEntry::from_result(id, result, now_utc()));
        if let Some(capacity) = self.capacity {
            while inner.entries.len() > capacity {
                inner.entries.pop_front();
            }
        }
        Ok(id)
    }

    async fn read(&self, symbol: &str, limit: usize) -> Result<Vec<PersistedEntry>, LogError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(LogError::PersistenceFailed("storage unavailable".to_string()));
        }

        let symbol = normalize_symbol(symbol);
        let inner = self.inner.lock().await;
        Ok(inner
            .entries
            .iter()
            .rev()
            .filter(|e| e.symbol == symbol)
            .take(limit)
            .cloned()
            .collect())
    }
}
