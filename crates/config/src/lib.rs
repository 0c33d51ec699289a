//! # Config - Shared types and on-disk constants
//!
//! Every crate in the Silt workspace speaks the same vocabulary: `u64` keys,
//! opaque byte-string values, and engine-assigned timestamps. This crate pins
//! that vocabulary together with the numeric constants of the SST file format
//! and the directory naming scheme, so that the writer, the reader and the
//! engine can never drift apart.

use std::collections::HashMap;

/// A key as seen by the store: an unsigned 64-bit integer.
pub type LsmKey = u64;

/// A value as seen by the store: an opaque byte string.
pub type LsmValue = Vec<u8>;

/// Engine-assigned monotonic version tag. Strictly larger means newer.
pub type TimeStamp = u64;

/// Unordered key-to-value mapping used while gathering compaction inputs.
pub type KvMap = HashMap<LsmKey, LsmValue>;

/// Tombstone sentinel. Written into the memtable and SSTs as a regular
/// nine-byte value; only the read path and the deepest-level compaction
/// interpret it.
pub const DELETE_SIGN: &[u8] = b"~DELETED~";

/// Size of the fixed SST header: `timeStamp`, `keyNumber`, `minKey`,
/// `maxKey`, each a little-endian `u64`.
pub const HEADER_SIZE: usize = 32;

/// Serialized bloom filter size: one byte per slot, 10 240 slots.
pub const BLOOM_FILTER_SIZE: usize = 10_240;

/// Size of one sparse index entry: `key: u64` + `offset: u32`.
pub const DATA_INDEX_SIZE: usize = 12;

/// Hard cap on the total size of a single SST file, and the flush threshold
/// for the memtable's projected serialized size.
pub const MAX_SSTABLE_SIZE: usize = 2 * 1024 * 1024;

/// Seed for the 128-bit murmur hash feeding the bloom filter slots.
pub const BLOOM_SEED: u32 = 1;

/// Extension of every table file, temporary or published.
pub const SST_EXT: &str = "sst";

/// Returns `true` if the stored bytes are the tombstone sentinel.
#[must_use]
pub fn is_tombstone(value: &[u8]) -> bool {
    value == DELETE_SIGN
}

/// File capacity of a level: `2^(L+1)`, so 2, 4, 8, 16, …
///
/// Level 0 is special-cased by the engine (it compacts on *reaching* three
/// files rather than on exceeding its capacity).
#[must_use]
pub fn level_capacity(level: usize) -> usize {
    2usize << level
}

/// Directory name of a level under the data root, e.g. `level-0`.
#[must_use]
pub fn level_dir_name(level: usize) -> String {
    format!("level-{level}")
}

/// Canonical file name of a published SST: `table-<ts>-<min>-<max>.sst`,
/// integers in decimal with no padding.
#[must_use]
pub fn sst_file_name(time_stamp: TimeStamp, min_key: LsmKey, max_key: LsmKey) -> String {
    format!("table-{time_stamp}-{min_key}-{max_key}.{SST_EXT}")
}

/// Name an in-progress SST is written under before the publishing rename.
#[must_use]
pub fn tmp_file_name(time_stamp: TimeStamp) -> String {
    format!("table-{time_stamp}.{SST_EXT}")
}
