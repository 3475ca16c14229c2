// src/ring_buffer.rs
//! Ring buffer sink for bounded in-memory capture of boundary logs.
//!
//! Keeps the most recent entries with FIFO eviction, so a burst of failing
//! requests cannot exhaust memory. Useful for debug endpoints that show
//! recent errors, and for asserting on log output in tests.
//!
//! # Design Principles
//!
//! - **Bounded memory**: Fixed maximum entry count regardless of error volume
//! - **FIFO eviction**: Oldest entries dropped first
//! - **Per-entry message cap**: No single error can dominate the buffer
//! - **RwLock-based**: Concurrent readers, exclusive writers
//!
//! Recorded messages and fields are copies held behind `Arc`s and are not
//! zeroized when evicted or cleared. Don't point this sink at errors whose
//! internal text must not outlive the request.
//!
//! # Example
//!
//! ```rust
//! use gqlerr::{ErrorPresenter, GqlError, RequestContext, SinkLevel};
//! use gqlerr::ring_buffer::RingBufferSink;
//!
//! let sink = RingBufferSink::new(1000, 2048);
//! let presenter = ErrorPresenter::new(sink.clone());
//!
//! let ctx = RequestContext::background();
//! presenter.present_error(GqlError::internal(&ctx, "db down", []));
//!
//! let recent = sink.get_recent(10);
//! assert_eq!(recent[0].level, SinkLevel::Error);
//! assert_eq!(recent[0].message.as_ref(), "db down");
//! ```

use crate::logging::truncate_to_bytes;
use crate::{Field, LogEntry, LogSink, SinkLevel};
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

/// A captured log entry.
///
/// Uses `Arc` for message and fields so handing out copies through
/// `get_recent()` is a refcount bump, not a deep clone.
#[derive(Clone, Debug)]
pub struct RecordedEntry {
    /// Unix timestamp of the write
    pub timestamp: u64,
    /// Sink method the entry was logged with
    pub level: SinkLevel,
    /// Log message, possibly truncated
    pub message: Arc<str>,
    /// Fields in logged order, `gql_path` first when present
    pub fields: Arc<[Field]>,
}

impl RecordedEntry {
    /// First field with the given key.
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key() == key)
    }

    /// Keys in logged order.
    pub fn keys(&self) -> Vec<&'static str> {
        self.fields.iter().map(Field::key).collect()
    }
}

/// Fixed-size ring buffer with exact allocation (no growth).
struct RingBuffer {
    entries: Box<[Option<RecordedEntry>]>,
    tail: usize,
    head: usize,
    len: usize,
}

impl RingBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            entries: std::iter::repeat_with(|| None)
                .take(capacity)
                .collect::<Box<[Option<RecordedEntry>]>>(),
            tail: 0,
            head: 0,
            len: 0,
        }
    }

    fn push(&mut self, entry: RecordedEntry) -> Option<RecordedEntry> {
        let evicted = self.entries[self.tail].replace(entry);
        self.tail = (self.tail + 1) % self.entries.len();

        if self.len < self.entries.len() {
            self.len += 1;
        } else {
            self.head = (self.head + 1) % self.entries.len();
        }

        evicted
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    fn iter(&self) -> impl DoubleEndedIterator<Item = &RecordedEntry> {
        let head = self.head;
        let len = self.len;
        let cap = self.entries.len();

        (0..len).filter_map(move |i| {
            let idx = (head + i) % cap;
            self.entries[idx].as_ref()
        })
    }

    fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = None;
        }
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }
}

/// Log sink backed by a bounded ring buffer.
///
/// Clones share the same buffer, so a test can keep one handle and give the
/// other to an [`ErrorPresenter`](crate::ErrorPresenter).
#[derive(Clone)]
pub struct RingBufferSink {
    buffer: Arc<RwLock<RingBuffer>>,
    max_entries: usize,
    max_message_bytes: usize,
    eviction_count: Arc<AtomicU64>,
}

impl RingBufferSink {
    /// Create a sink holding at most `max_entries` entries, with messages
    /// capped at `max_message_bytes`.
    ///
    /// Stack traces from recovered panics are long, so give the message cap
    /// some room if those need to be inspected.
    pub fn new(max_entries: usize, max_message_bytes: usize) -> Self {
        let bounded_entries = max_entries.max(1);
        Self {
            buffer: Arc::new(RwLock::new(RingBuffer::new(bounded_entries))),
            max_entries: bounded_entries,
            max_message_bytes,
            eviction_count: Arc::new(AtomicU64::new(0)),
        }
    }

    #[inline]
    fn read_buffer(&self) -> RwLockReadGuard<'_, RingBuffer> {
        match self.buffer.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[inline]
    fn write_buffer(&self) -> RwLockWriteGuard<'_, RingBuffer> {
        match self.buffer.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn create_entry(&self, entry: &LogEntry<'_>) -> RecordedEntry {
        let message = truncate_to_bytes(entry.message(), self.max_message_bytes);
        RecordedEntry {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
            level: entry.level(),
            message: Arc::from(message.as_ref()),
            fields: entry.fields().cloned().collect(),
        }
    }

    /// Get the N most recent entries in reverse chronological order.
    pub fn get_recent(&self, count: usize) -> Vec<RecordedEntry> {
        let buffer = self.read_buffer();
        buffer.iter().rev().take(count).cloned().collect()
    }

    /// Get all entries in chronological order.
    pub fn get_all(&self) -> Vec<RecordedEntry> {
        let buffer = self.read_buffer();
        buffer.iter().cloned().collect()
    }

    /// Get entries matching a predicate, in chronological order.
    ///
    /// ```rust
    /// # use gqlerr::ring_buffer::RingBufferSink;
    /// # use gqlerr::SinkLevel;
    /// # let sink = RingBufferSink::new(100, 1024);
    /// let errors = sink.get_filtered(|entry| entry.level >= SinkLevel::Error);
    /// ```
    pub fn get_filtered<F>(&self, predicate: F) -> Vec<RecordedEntry>
    where
        F: Fn(&RecordedEntry) -> bool,
    {
        let buffer = self.read_buffer();
        buffer.iter().filter(|e| predicate(e)).cloned().collect()
    }

    /// Get current number of entries in buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.read_buffer().len()
    }

    /// Check if buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get total number of evictions since creation.
    #[inline]
    pub fn eviction_count(&self) -> u64 {
        self.eviction_count.load(Ordering::Relaxed)
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.write_buffer().clear();
    }

    /// Get buffer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.max_entries
    }
}

impl LogSink for RingBufferSink {
    fn log(&self, entry: &LogEntry<'_>) {
        let recorded = self.create_entry(entry);

        let mut buffer = self.write_buffer();
        if buffer.push(recorded).is_some() {
            self.eviction_count.fetch_add(1, Ordering::Relaxed);
        }
    }
}
