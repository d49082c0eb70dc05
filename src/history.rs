//! Bounded in-memory history of answered queries.
//!
//! [`HistoryBuffer`] keeps the most recent exchanges in insertion order and
//! drops the oldest once capacity is reached. Eviction and append happen
//! under one lock, so `len() <= capacity()` holds even while many requests
//! complete at once. Nothing is persisted; a restart starts empty.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

/// Default number of retained exchanges.
pub const DEFAULT_CAPACITY: usize = 100;

/// One answered question. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub question: String,
    pub response: String,
    /// RFC 3339 UTC timestamp taken when the answer arrived.
    pub timestamp: String,
}

#[derive(Debug)]
pub struct HistoryBuffer {
    capacity: usize,
    entries: Mutex<VecDeque<HistoryEntry>>,
}

impl HistoryBuffer {
    /// Storage is reserved up to [`DEFAULT_CAPACITY`]; larger buffers grow
    /// as entries arrive.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append `entry`, evicting from the front so the buffer never holds
    /// more than `capacity` entries, not even transiently.
    pub fn push(&self, entry: HistoryEntry) {
        self.push_with(|| entry);
    }

    /// Build an entry while holding the lock and append it, returning a copy.
    ///
    /// Anything `make` samples (the clock, say) is taken in the same order
    /// entries land in the buffer.
    pub fn push_with(&self, make: impl FnOnce() -> HistoryEntry) -> HistoryEntry {
        if self.capacity == 0 {
            return make();
        }
        let mut entries = self.lock();
        let entry = make();
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry.clone());
        entry
    }

    /// The last `limit` entries, oldest first. `limit <= 0` yields nothing.
    pub fn recent(&self, limit: i64) -> Vec<HistoryEntry> {
        let Ok(limit) = usize::try_from(limit) else {
            return Vec::new();
        };
        let entries = self.lock();
        let start = entries.len().saturating_sub(limit);
        entries.range(start..).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding the lock cannot leave the deque half-modified,
    // so a poisoned mutex is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<HistoryEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn entry(i: usize) -> HistoryEntry {
        HistoryEntry {
            question: format!("q{i}"),
            response: format!("r{i}"),
            timestamp: format!("2026-10-16T00:00:{:02}Z", i % 60),
        }
    }

    #[test]
    fn starts_empty() {
        let h = HistoryBuffer::default();
        assert!(h.is_empty());
        assert_eq!(h.capacity(), DEFAULT_CAPACITY);
        assert!(h.recent(10).is_empty());
    }

    #[test]
    fn length_tracks_pushes_until_capacity() {
        let h = HistoryBuffer::default();
        for i in 0..250 {
            h.push(entry(i));
            assert_eq!(h.len(), (i + 1).min(100));
        }
    }

    #[test]
    fn overflow_keeps_most_recent_oldest_first() {
        let h = HistoryBuffer::default();
        for i in 0..130 {
            h.push(entry(i));
        }
        let all = h.recent(100);
        assert_eq!(all.len(), 100);
        assert_eq!(all.first().unwrap().question, "q30");
        assert_eq!(all.last().unwrap().question, "q129");
        let expected: Vec<_> = (30..130).map(entry).collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn recent_returns_tail_window() {
        let h = HistoryBuffer::new(10);
        for i in 0..5 {
            h.push(entry(i));
        }
        let last_two: Vec<_> = h.recent(2).into_iter().map(|e| e.question).collect();
        assert_eq!(last_two, ["q3", "q4"]);
    }

    #[test]
    fn recent_non_positive_limit_is_empty() {
        let h = HistoryBuffer::new(10);
        h.push(entry(0));
        assert!(h.recent(0).is_empty());
        assert!(h.recent(-3).is_empty());
        assert!(h.recent(i64::MIN).is_empty());
    }

    #[test]
    fn recent_larger_than_len_returns_everything() {
        let h = HistoryBuffer::new(10);
        for i in 0..3 {
            h.push(entry(i));
        }
        assert_eq!(h.recent(50).len(), 3);
        assert_eq!(h.recent(i64::MAX).len(), 3);
    }

    #[test]
    fn zero_capacity_retains_nothing() {
        let h = HistoryBuffer::new(0);
        h.push(entry(0));
        assert!(h.is_empty());
    }

    #[test]
    fn concurrent_pushes_respect_capacity() {
        let h = Arc::new(HistoryBuffer::new(100));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let h = Arc::clone(&h);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        h.push(entry(t * 1000 + i));
                        assert!(h.len() <= 100);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(h.len(), 100);
    }

    #[test]
    fn huge_capacity_does_not_preallocate() {
        let h = HistoryBuffer::new(usize::MAX);
        assert_eq!(h.capacity(), usize::MAX);
        for i in 0..3 {
            h.push(entry(i));
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.recent(10).last().unwrap().question, "q2");
    }

    #[test]
    fn push_with_returns_stored_entry() {
        let h = HistoryBuffer::new(2);
        let stored = h.push_with(|| entry(7));
        assert_eq!(stored, entry(7));
        assert_eq!(h.recent(1), vec![entry(7)]);
    }

    #[test]
    fn push_with_zero_capacity_still_builds() {
        let h = HistoryBuffer::new(0);
        let built = h.push_with(|| entry(1));
        assert_eq!(built.question, "q1");
        assert!(h.is_empty());
    }

    #[test]
    fn concurrent_push_with_stamps_in_buffer_order() {
        let h = Arc::new(HistoryBuffer::new(1000));
        let clock = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let h = Arc::clone(&h);
                let clock = Arc::clone(&clock);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        h.push_with(|| {
                            let tick = clock.fetch_add(1, Ordering::SeqCst);
                            HistoryEntry {
                                question: String::new(),
                                response: String::new(),
                                timestamp: format!("{tick:08}"),
                            }
                        });
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stamps: Vec<_> = h.recent(1000).into_iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps.len(), 800);
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }
}
