//! Sorted-unique key merge over multiple SSTable key streams.
//!
//! Produces each distinct key exactly once, in ascending order, across any
//! number of input tables. When the same key is pending from several sources
//! the newest (largest timestamp) source is popped first; later copies of the
//! key are swallowed.
//!
//! This is the merge primitive of compaction: the engine pairs the key stream
//! with a value map built by timestamp-ordered ingestion, so which duplicate
//! emits first does not affect the chosen value -- only that each key is
//! emitted once, in order.

use config::{LsmKey, TimeStamp};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::SsTable;

/// A pending key from one input stream.
struct HeapEntry {
    key: LsmKey,
    time_stamp: TimeStamp,
    /// Index into the source streams.
    source: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse the key comparison so the
        // smallest key surfaces first. On equal keys the newest source wins,
        // then the lower source index, for determinism.
        other
            .key
            .cmp(&self.key)
            .then_with(|| self.time_stamp.cmp(&other.time_stamp))
            .then_with(|| other.source.cmp(&self.source))
    }
}

/// Min-heap merge of several ascending key streams into one ascending,
/// duplicate-free stream.
pub struct KeyMerger {
    streams: Vec<std::vec::IntoIter<LsmKey>>,
    heap: BinaryHeap<HeapEntry>,
    last_emitted: Option<LsmKey>,
}

impl KeyMerger {
    /// Creates a merger over `(timeStamp, ascending keys)` sources.
    pub fn new(sources: Vec<(TimeStamp, Vec<LsmKey>)>) -> Self {
        let mut streams = Vec::with_capacity(sources.len());
        let mut heap = BinaryHeap::new();

        for (source, (time_stamp, keys)) in sources.into_iter().enumerate() {
            let mut stream = keys.into_iter();
            if let Some(first) = stream.next() {
                heap.push(HeapEntry {
                    key: first,
                    time_stamp,
                    source,
                });
            }
            streams.push(stream);
        }

        Self {
            streams,
            heap,
            last_emitted: None,
        }
    }

    /// Creates a merger over the key streams of the given tables.
    pub fn from_tables(tables: &[&SsTable]) -> Self {
        Self::new(
            tables
                .iter()
                .map(|t| (t.time_stamp(), t.keys().collect()))
                .collect(),
        )
    }

    /// Returns the next distinct key in ascending order, or `None` when all
    /// streams are exhausted.
    pub fn next_key(&mut self) -> Option<LsmKey> {
        loop {
            let top = self.heap.pop()?;

            // Keep this source flowing.
            if let Some(next) = self.streams[top.source].next() {
                self.heap.push(HeapEntry {
                    key: next,
                    time_stamp: top.time_stamp,
                    source: top.source,
                });
            }

            // Equal keys pop consecutively; swallow every copy after the first.
            if self.last_emitted == Some(top.key) {
                continue;
            }
            self.last_emitted = Some(top.key);
            return Some(top.key);
        }
    }
}

impl Iterator for KeyMerger {
    type Item = LsmKey;

    fn next(&mut self) -> Option<LsmKey> {
        self.next_key()
    }
}
