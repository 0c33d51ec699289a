//! Write path: `put()`, `del()`, `reset()`, and the internal `flush()`.
//!
//! Every mutation flows through the memtable. The engine tracks the
//! projected size of the level-0 SST the memtable would serialize to; a
//! write that would push the projection past the file cap flushes first, so
//! no flushed file ever exceeds the cap.

use anyhow::Result;
use config::{
    level_dir_name, LsmKey, LsmValue, BLOOM_FILTER_SIZE, DATA_INDEX_SIZE, DELETE_SIGN,
    HEADER_SIZE, MAX_SSTABLE_SIZE,
};
use sstable::SsTableWriter;
use std::fs;
use tracing::{debug, info};

use crate::Engine;

impl Engine {
    /// Inserts or updates a key-value pair.
    ///
    /// If the projected level-0 file size including this entry would exceed
    /// the cap, the memtable is flushed (and the compaction cascade run)
    /// before the pair is inserted. A projection exactly at the cap does not
    /// flush.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure during a flush or compaction.
    pub fn put(&mut self, key: LsmKey, value: LsmValue) -> Result<()> {
        let projected =
            HEADER_SIZE + BLOOM_FILTER_SIZE + self.mem_size + DATA_INDEX_SIZE + value.len();
        if projected > MAX_SSTABLE_SIZE {
            self.flush()?;
        }

        // Replacements are counted again: the estimate is an upper bound and
        // may only over-trigger a flush, never undersize a file.
        self.mem_size += DATA_INDEX_SIZE + value.len();
        self.mem.put(key, value);
        Ok(())
    }

    /// Deletes a key by writing the tombstone sentinel through the normal
    /// write path.
    ///
    /// Returns `true` iff a live value was visible immediately before the
    /// call. The tombstone is written unconditionally, even for keys that
    /// never existed, so a later compaction can still shadow older files.
    ///
    /// # Errors
    ///
    /// Returns an error if the preceding lookup or the tombstone write
    /// fails.
    pub fn del(&mut self, key: LsmKey) -> Result<bool> {
        let current = self.get(key)?;
        let existed = !current.is_empty() && current != DELETE_SIGN;
        self.put(key, DELETE_SIGN.to_vec())?;
        Ok(existed)
    }

    /// Drops all state: every SST file, every level directory, the memtable
    /// and the timestamp counter.
    ///
    /// # Errors
    ///
    /// Returns an error if removing a level directory fails.
    pub fn reset(&mut self) -> Result<()> {
        for level in 0..self.levels.len() {
            let level_dir = self.dir.join(level_dir_name(level));
            if level_dir.is_dir() {
                fs::remove_dir_all(&level_dir)?;
            }
        }
        self.levels.clear();
        self.levels.push(Vec::new());
        self.mem.reset();
        self.mem_size = 0;
        self.time_stamp = 1;
        info!(dir = %self.dir.display(), "store reset");
        Ok(())
    }

    /// Materializes the memtable as a level-0 SST, advances the timestamp,
    /// and runs the compaction cascade. A no-op when the memtable is empty.
    pub(crate) fn flush(&mut self) -> Result<()> {
        if self.mem.is_empty() {
            return Ok(());
        }
        debug!(
            time_stamp = self.time_stamp,
            keys = self.mem.len(),
            "flushing memtable to level 0"
        );

        let table = SsTableWriter::write_from_memtable(&self.dir, self.time_stamp, &self.mem)?;
        self.levels[0].push(table);
        self.time_stamp += 1;
        self.mem.reset();
        self.mem_size = 0;

        self.run_compaction_cascade()
    }
}
