//! Ring Buffer Implementation

use crate::{HistoryError, Timestamped};
use std::collections::VecDeque;

/// Default buffer capacity (100 observations = 30s at the 300ms poll cadence)
pub const DEFAULT_CAPACITY: usize = 100;

/// Bounded FIFO of timestamped entries, oldest first.
///
/// Entries are kept in non-decreasing timestamp order; a push that would
/// break the ordering is rejected. Once full, every push evicts the oldest
/// entry.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Entries in capture order
    storage: VecDeque<T>,
    /// Maximum retained entries
    capacity: usize,
    /// Total entries accepted (for statistics)
    total_written: usize,
}

impl<T: Timestamped + Clone> RingBuffer<T> {
    /// Create a new ring buffer with given capacity (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            storage: VecDeque::with_capacity(capacity),
            capacity,
            total_written: 0,
        }
    }

    /// Create a buffer with default capacity (100 entries)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Append an entry, evicting the oldest if the buffer is full
    pub fn push(&mut self, entry: T) -> Result<(), HistoryError> {
        if let Some(newest) = self.storage.back() {
            let newest_ms = newest.timestamp_ms();
            if entry.timestamp_ms() < newest_ms {
                return Err(HistoryError::OutOfOrder {
                    timestamp_ms: entry.timestamp_ms(),
                    newest_ms,
                });
            }
        }

        if self.storage.len() == self.capacity {
            self.storage.pop_front();
        }
        self.storage.push_back(entry);
        self.total_written += 1;
        Ok(())
    }

    /// Get the number of entries currently in the buffer
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.storage.len() == self.capacity
    }

    /// Get the buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Newest entry, if any
    pub fn latest(&self) -> Option<&T> {
        self.storage.back()
    }

    /// Read the last N entries (most recent first)
    pub fn read_last(&self, count: usize) -> Vec<T> {
        self.storage.iter().rev().take(count).cloned().collect()
    }

    /// Read the entries captured within `duration_ms` before `now_ms`.
    ///
    /// Returns the contiguous suffix with `now_ms - timestamp < duration_ms`
    /// in capture order. Entries stamped after `now_ms` are left out.
    pub fn read_window(&self, duration_ms: u64, now_ms: u64) -> Vec<T> {
        if duration_ms == 0 {
            return Vec::new();
        }
        // Oldest timestamp still inside the window
        let cutoff = now_ms.saturating_sub(duration_ms - 1);
        let start = self.storage.partition_point(|e| e.timestamp_ms() < cutoff);

        self.storage
            .range(start..)
            .take_while(|e| e.timestamp_ms() <= now_ms)
            .cloned()
            .collect()
    }

    /// Iterate over all entries in capture order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.storage.iter()
    }

    /// Get total entries accepted (for statistics)
    pub fn total_written(&self) -> usize {
        self.total_written
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.storage.clear();
    }
}

impl<T: Timestamped + Clone> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
