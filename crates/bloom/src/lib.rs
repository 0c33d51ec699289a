//! # Bloom Filter
//!
//! A space-efficient probabilistic data structure for set membership testing.
//!
//! A bloom filter can tell you with certainty that a key is **not** in the set
//! (no false negatives), but may occasionally report that a key **is** in the
//! set when it isn't (false positives).
//!
//! ## Usage in Silt
//!
//! Every SST file embeds one filter of a fixed 10 240 slots, serialized as one
//! byte per slot immediately after the file header. During point lookups the
//! table handle checks the filter first -- if it says "not present", the
//! sparse index and the file on disk are never touched.
//!
//! Each key claims four slots, taken from the four 32-bit words of a seeded
//! 128-bit MurmurHash3 of the key's little-endian bytes.
//!
//! ## Example
//!
//! ```rust
//! use bloom::BloomFilter;
//!
//! let mut bf = BloomFilter::new();
//! bf.insert(42);
//! assert!(bf.has_key(42));
//! ```

use config::{LsmKey, BLOOM_FILTER_SIZE, BLOOM_SEED};
use murmur3::murmur3_x64_128;
use std::io::{self, Cursor, Read, Write};

/// A fixed-capacity bloom filter with one byte of storage per slot.
///
/// The serialized form is exactly [`BLOOM_FILTER_SIZE`] bytes: a non-zero
/// byte marks a set slot. Keeping a whole byte per slot matches the on-disk
/// format, so (de)serialization is a plain copy.
pub struct BloomFilter {
    slots: Vec<u8>,
}

impl BloomFilter {
    /// Creates an empty filter with all slots clear.
    pub fn new() -> Self {
        Self {
            slots: vec![0u8; BLOOM_FILTER_SIZE],
        }
    }

    /// Creates a filter from raw slot bytes (used during deserialization).
    fn from_raw(slots: Vec<u8>) -> Self {
        Self { slots }
    }

    /// Inserts a key, setting its four slots.
    pub fn insert(&mut self, key: LsmKey) {
        for slot in slot_indices(key) {
            self.slots[slot] = 1;
        }
    }

    /// Returns `true` if the key **might** have been inserted, `false` if it
    /// **definitely was not**.
    #[must_use]
    pub fn has_key(&self, key: LsmKey) -> bool {
        slot_indices(key).iter().all(|&slot| self.slots[slot] != 0)
    }

    /// Serializes the filter: exactly [`BLOOM_FILTER_SIZE`] bytes, one per
    /// slot, non-zero meaning set.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.slots)
    }

    /// Deserializes a filter written by [`write_to`](BloomFilter::write_to).
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut slots = vec![0u8; BLOOM_FILTER_SIZE];
        r.read_exact(&mut slots)?;
        Ok(Self::from_raw(slots))
    }
}

impl Default for BloomFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("slots", &self.slots.len())
            .field("set", &self.slots.iter().filter(|&&b| b != 0).count())
            .finish()
    }
}

/// The four slot indices a key maps to.
///
/// The 128-bit murmur hash of the key's 8-byte little-endian encoding is
/// consumed as four 32-bit words, each reduced modulo the slot count.
fn slot_indices(key: LsmKey) -> [usize; 4] {
    // The hash reads from an in-memory cursor; the io::Result is always Ok.
    let hash = murmur3_x64_128(&mut Cursor::new(key.to_le_bytes()), BLOOM_SEED).unwrap_or_default();
    let words = [
        hash as u32,
        (hash >> 32) as u32,
        (hash >> 64) as u32,
        (hash >> 96) as u32,
    ];
    words.map(|w| w as usize % BLOOM_FILTER_SIZE)
}
