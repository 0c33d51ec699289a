//! # Silt
//!
//! An embedded, single-process key-value store over a leveled LSM-tree.
//!
//! Keys are `u64`, values are opaque byte strings. Writes buffer in memory
//! and flush to immutable sorted files once the buffer would outgrow one
//! file; leveled compaction keeps the file population of every level
//! bounded and retires overwritten versions.
//!
//! This crate is the embedding surface: a thin [`Store`] forwarding to the
//! [`engine`] crate. There is no server, no CLI and no write-ahead log --
//! the buffered tail of the write stream is lost on shutdown, and
//! durability begins at the first flush.
//!
//! ## Example
//!
//! ```no_run
//! use silt::Store;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut store = Store::open("data")?;
//! store.put(1, b"hello".to_vec())?;
//! assert_eq!(store.get(1)?, b"hello");
//! assert!(store.del(1)?);
//! assert_eq!(store.get(1)?, b"");
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use std::path::Path;

pub use engine::Engine;

/// An embedded key-value store rooted at one data directory.
pub struct Store {
    engine: Engine,
}

impl Store {
    /// Opens or creates a store rooted at `dir`.
    ///
    /// Existing level directories are scanned and their tables registered;
    /// any compaction work left over from a previous run is finished before
    /// the store is handed out.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure or when a corrupt table file is
    /// encountered.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Ok(Self {
            engine: Engine::new(dir)?,
        })
    }

    /// Inserts or updates a key-value pair.
    ///
    /// Note: the nine-byte string `~DELETED~` is the store's tombstone
    /// sentinel. A user value equal to it is indistinguishable from a
    /// deletion.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure during an implied flush or
    /// compaction.
    pub fn put(&mut self, key: u64, value: Vec<u8>) -> Result<()> {
        self.engine.put(key, value)
    }

    /// Looks up a key. The empty value means "absent or deleted".
    ///
    /// # Errors
    ///
    /// Returns an error if reading a table file fails.
    pub fn get(&self, key: u64) -> Result<Vec<u8>> {
        self.engine.get(key)
    }

    /// Deletes a key, returning `true` iff a live value existed immediately
    /// before the call.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn del(&mut self, key: u64) -> Result<bool> {
        self.engine.del(key)
    }

    /// Drops all state, on disk and in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if removing a level directory fails.
    pub fn reset(&mut self) -> Result<()> {
        self.engine.reset()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("engine", &self.engine).finish()
    }
}
