//! # Engine - Silt Storage Engine
//!
//! The central controller that ties the [`memtable`] and [`sstable`] crates
//! into a complete leveled LSM-tree key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌───────────────────────────────────────────────────┐
//! │                     ENGINE                        │
//! │                                                   │
//! │ write.rs → MemTable insert                        │
//! │              |                                    │
//! │              |  (projected SST size > cap?)       │
//! │              |            yes                     │
//! │              v                                    │
//! │           flush() → new level-0 SST               │
//! │              |                                    │
//! │              |  (level-0 reaches 3 files?)        │
//! │              |  (level L exceeds 2^(L+1)?)        │
//! │              v                                    │
//! │        compaction.rs → merged deeper SSTs         │
//! │                                                   │
//! │ read.rs → MemTable → L0 (all files) → one         │
//! │           candidate per deeper level              │
//! │           (largest timestamp wins)                │
//! └───────────────────────────────────────────────────┘
//! ```
//!
//! ## Module responsibilities
//!
//! | Module          | Purpose                                              |
//! |-----------------|------------------------------------------------------|
//! | `lib.rs`        | `Engine` struct, constructor, accessors, `Debug`     |
//! | [`recovery`]    | level-directory scan, timestamp reconstruction       |
//! | [`write`]       | `put()`, `del()`, `reset()`, internal `flush()`      |
//! | [`read`]        | `get()` across memory and all disk levels            |
//! | [`levels`]      | sorted per-level lists: candidate + overlap search   |
//! | [`compaction`]  | the overflow cascade, L0→L1 and leveled compaction   |
//!
//! ## Levels
//!
//! ```text
//! ┌────────────────────────────┐  ← freshest, checked first
//! │ MEMTABLE                   │
//! ├────────────────────────────┤  ← flush order, ranges may overlap
//! │ L0  (compacts at 3 files)  │
//! ├────────────────────────────┤  ← minKey-sorted, pairwise disjoint
//! │ L1  (up to 4 files)        │
//! ├────────────────────────────┤
//! │ L2  (up to 8 files), …     │
//! └────────────────────────────┘
//! ```
//!
//! The engine is single-threaded and synchronous: every operation runs to
//! completion before the next begins, and every SST file handle opened on
//! behalf of an operation is closed before it returns. There is no
//! write-ahead log; the memtable's contents are lost on shutdown and
//! durability begins at the first flush.

mod compaction;
mod levels;
mod read;
mod recovery;
mod write;

use anyhow::Result;
use config::{LsmKey, TimeStamp};
use memtable::MemTable;
use sstable::SsTable;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// The storage engine: one memtable, one ordered list of SST handles per
/// level, and the monotonic timestamp counter.
///
/// # Write path
///
/// 1. If the projected level-0 file size (header + bloom filter + one index
///    entry and the value bytes per write) would exceed the file cap, flush
///    the memtable to a new level-0 SST, then run the compaction cascade.
/// 2. Insert the pair into the memtable.
///
/// # Read path
///
/// 1. Check the memtable (freshest data, tombstones included).
/// 2. Ask every level-0 SST, keeping the answer with the largest timestamp.
/// 3. Otherwise binary-search one candidate file per deeper level.
/// 4. A tombstone result means "deleted": the empty value is returned.
///
/// # Deletes
///
/// `del` writes the nine-byte tombstone sentinel through the normal write
/// path. Tombstones travel through flushes and compactions and are dropped
/// once a compaction targets the deepest level.
pub struct Engine {
    pub(crate) dir: PathBuf,
    pub(crate) mem: MemTable,
    /// `levels[0]` is insertion-ordered (newest flush last); every deeper
    /// list is sorted by `minKey` with pairwise disjoint key ranges.
    pub(crate) levels: Vec<Vec<SsTable>>,
    /// Next timestamp to assign; incremented once per flush.
    pub(crate) time_stamp: TimeStamp,
    /// Running estimate of the serialized memtable payload: one index entry
    /// plus the value bytes per `put`, replacements counted again (an upper
    /// bound, never an underestimate).
    pub(crate) mem_size: usize,
}

impl Engine {
    /// Opens or creates an engine rooted at `dir`.
    ///
    /// Scans `level-0`, `level-1`, … until a missing directory, loading the
    /// header, bloom filter and full sparse index of every SST found. The
    /// timestamp counter restarts strictly above every on-disk timestamp,
    /// deeper levels are re-sorted by `minKey`, and the compaction cascade
    /// runs once to clear any overflow left behind.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or when a corrupt SST is encountered.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let mut levels = recovery::load_levels(&dir)?;
        if levels.is_empty() {
            levels.push(Vec::new());
        }
        levels[0].sort_by_key(SsTable::time_stamp);
        for level in levels.iter_mut().skip(1) {
            level.sort_by_key(SsTable::min_key);
        }

        let time_stamp = recovery::next_time_stamp(&levels);
        info!(
            dir = %dir.display(),
            levels = levels.len(),
            tables = levels.iter().map(Vec::len).sum::<usize>(),
            time_stamp,
            "engine opened"
        );

        let mut engine = Self {
            dir,
            mem: MemTable::new(),
            levels,
            time_stamp,
            mem_size: 0,
        };
        engine.run_compaction_cascade()?;
        Ok(engine)
    }

    /// Returns the next timestamp the engine will assign.
    #[must_use]
    pub fn time_stamp(&self) -> TimeStamp {
        self.time_stamp
    }

    /// Returns the number of levels, the (possibly empty) level 0 included.
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Returns the number of SST files registered in `level`.
    #[must_use]
    pub fn tables_in_level(&self, level: usize) -> usize {
        self.levels.get(level).map_or(0, Vec::len)
    }

    /// Returns the data root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Grows the level table so `levels[level]` exists.
    pub(crate) fn ensure_level(&mut self, level: usize) {
        while self.levels.len() <= level {
            self.levels.push(Vec::new());
        }
    }

    /// Smallest and largest key across a set of tables.
    pub(crate) fn key_span(tables: &[SsTable]) -> (LsmKey, LsmKey) {
        tables.iter().fold((LsmKey::MAX, LsmKey::MIN), |(lo, hi), t| {
            (lo.min(t.min_key()), hi.max(t.max_key()))
        })
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("dir", &self.dir)
            .field("time_stamp", &self.time_stamp)
            .field("memtable_keys", &self.mem.len())
            .field("memtable_payload", &self.mem_size)
            .field(
                "levels",
                &self.levels.iter().map(Vec::len).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests;
