//! # SSTable - Sorted String Table
//!
//! Immutable, on-disk storage files for the Silt storage engine.
//!
//! When the in-memory [`memtable::MemTable`] outgrows the projected file-size
//! cap the engine flushes it to disk as a level-0 SSTable. SSTables are
//! *write-once, read-many* -- once published they are never modified, only
//! superseded by compaction outputs and unlinked.
//!
//! ## File layout
//!
//! ```text
//! ┌──────────────┬────────┬──────────────────┬──────────────────────────────┐
//! │ Region       │ Offset │ Size             │ Contents                     │
//! ├──────────────┼────────┼──────────────────┼──────────────────────────────┤
//! │ Header       │ 0      │ 32               │ timeStamp, keyNumber,        │
//! │              │        │                  │ minKey, maxKey (u64 each)    │
//! │ Bloom filter │ 32     │ 10 240           │ one byte per slot            │
//! │ Index        │ 10 272 │ 12 * keyNumber   │ repeated {key: u64,          │
//! │              │        │                  │ offset: u32}                 │
//! │ Data         │ 10 272 │ remainder to EOF │ concatenated raw value bytes │
//! │              │ + 12n  │                  │ in key order                 │
//! └──────────────┴────────┴──────────────────┴──────────────────────────────┘
//! ```
//!
//! All integers are little-endian. Values carry no length prefix: the length
//! of entry `i` is `index[i+1].offset - index[i].offset`, or
//! `fileLength - index[i].offset` for the last entry.
//!
//! Files are published under `level-<L>/table-<timeStamp>-<minKey>-<maxKey>.sst`
//! after a complete write to the temporary name `table-<timeStamp>.sst`.

mod format;
mod merge;
mod reader;
mod writer;

pub use format::{data_start, DataIndex, SstHeader};
pub use merge::KeyMerger;
pub use reader::SsTable;
pub use writer::SsTableWriter;

#[cfg(test)]
mod tests;
