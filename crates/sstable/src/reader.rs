use anyhow::{bail, Context, Result};
use bloom::BloomFilter;
use config::{KvMap, LsmKey, LsmValue, TimeStamp, BLOOM_FILTER_SIZE, HEADER_SIZE};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::format::{data_start, DataIndex, SstHeader};

/// In-memory handle for one on-disk SSTable.
///
/// The header, bloom filter and the full sparse index live in memory for the
/// lifetime of the handle; value bytes stay on disk and are read on demand.
/// The file is opened per read and closed before the call returns -- handles
/// hold no file descriptors between operations.
///
/// Handles are owned exclusively by the engine's per-level lists; compaction
/// borrows them and never outlives the list.
pub struct SsTable {
    level: usize,
    header: SstHeader,
    bloom: BloomFilter,
    data_indexes: Vec<DataIndex>,
    path: PathBuf,
    /// Total file size in bytes; bounds the last value.
    file_size: u32,
}

impl SsTable {
    /// Builds a handle for a file the writer just published.
    pub(crate) fn from_parts(
        level: usize,
        header: SstHeader,
        bloom: BloomFilter,
        data_indexes: Vec<DataIndex>,
        path: PathBuf,
        file_size: u32,
    ) -> Self {
        Self {
            level,
            header,
            bloom,
            data_indexes,
            path,
            file_size,
        }
    }

    /// Opens an existing SSTable file, loading its header, bloom filter and
    /// full sparse index into memory.
    ///
    /// # Validation
    ///
    /// - the file must hold at least the header and bloom regions;
    /// - `keyNumber` must be non-zero and consistent with the file size;
    /// - index keys must be strictly ascending with offsets confined to the
    ///   data region;
    /// - the header's `minKey`/`maxKey` must agree with the index.
    ///
    /// # Errors
    ///
    /// Returns an error describing the corruption, or the underlying I/O
    /// failure.
    pub fn open(path: &Path, level: usize) -> Result<Self> {
        let raw_file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let file_size = raw_file.metadata()?.len();
        let mut file = BufReader::new(raw_file);

        if file_size < (HEADER_SIZE + BLOOM_FILTER_SIZE) as u64 {
            bail!("corrupt SSTable {}: file too small", path.display());
        }
        let file_size = u32::try_from(file_size)
            .with_context(|| format!("corrupt SSTable {}: oversized file", path.display()))?;

        let header = SstHeader::read_from(&mut file)
            .with_context(|| format!("corrupt SSTable {}: short header", path.display()))?;
        if header.key_number == 0 {
            bail!("corrupt SSTable {}: zero keyNumber", path.display());
        }
        if data_start(header.key_number) > u64::from(file_size) {
            bail!(
                "corrupt SSTable {}: keyNumber {} inconsistent with file size {}",
                path.display(),
                header.key_number,
                file_size
            );
        }

        let bloom = BloomFilter::read_from(&mut file)
            .with_context(|| format!("corrupt SSTable {}: short bloom filter", path.display()))?;

        let mut data_indexes = Vec::with_capacity(header.key_number as usize);
        let region_start = data_start(header.key_number) as u32;
        let mut prev: Option<DataIndex> = None;
        for _ in 0..header.key_number {
            let index = DataIndex::read_from(&mut file)
                .with_context(|| format!("corrupt SSTable {}: short index", path.display()))?;
            if index.offset < region_start || index.offset > file_size {
                bail!(
                    "corrupt SSTable {}: index offset {} outside the data region",
                    path.display(),
                    index.offset
                );
            }
            if let Some(prev) = prev {
                if prev.key >= index.key || prev.offset > index.offset {
                    bail!("corrupt SSTable {}: index out of order", path.display());
                }
            }
            prev = Some(index);
            data_indexes.push(index);
        }

        let first = data_indexes[0].key;
        let last = data_indexes[data_indexes.len() - 1].key;
        if header.min_key != first || header.max_key != last {
            bail!(
                "corrupt SSTable {}: header range [{}, {}] disagrees with index [{}, {}]",
                path.display(),
                header.min_key,
                header.max_key,
                first,
                last
            );
        }

        Ok(Self {
            level,
            header,
            bloom,
            data_indexes,
            path: path.to_path_buf(),
            file_size,
        })
    }

    /// Point lookup for a single key.
    ///
    /// The bloom filter is consulted first; a negative answer skips the
    /// index and the disk entirely. Returns `Ok(None)` when the key is not
    /// in this table. A returned value may be the tombstone sentinel --
    /// callers interpret it.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure while opening or reading the file.
    pub fn get(&self, key: LsmKey) -> Result<Option<LsmValue>> {
        if !self.bloom.has_key(key) {
            return Ok(None);
        }
        let slot = match self.data_indexes.binary_search_by_key(&key, |ix| ix.key) {
            Ok(slot) => slot,
            Err(_) => return Ok(None),
        };

        let start = self.data_indexes[slot].offset;
        let end = self.value_end(slot);

        let mut file = File::open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        file.seek(SeekFrom::Start(u64::from(start)))?;
        let mut value = vec![0u8; (end - start) as usize];
        file.read_exact(&mut value)
            .with_context(|| format!("corrupt SSTable {}: short value read", self.path.display()))?;

        Ok(Some(value))
    }

    /// Streams every value in one pass, in ascending key order, into `out`.
    ///
    /// Existing entries for the same keys are overwritten, so feeding tables
    /// in ascending timestamp order leaves the newest value per key in the
    /// map. Compaction uses this instead of per-key [`get`](SsTable::get)
    /// to avoid one seek per key.
    pub fn read_values_into(&self, out: &mut KvMap) -> Result<()> {
        let base = self.data_indexes[0].offset;
        let mut file = File::open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        file.seek(SeekFrom::Start(u64::from(base)))?;
        let mut data = vec![0u8; (self.file_size - base) as usize];
        file.read_exact(&mut data)
            .with_context(|| format!("corrupt SSTable {}: short data region", self.path.display()))?;

        for (slot, index) in self.data_indexes.iter().enumerate() {
            let start = (index.offset - base) as usize;
            let end = (self.value_end(slot) - base) as usize;
            out.insert(index.key, data[start..end].to_vec());
        }
        Ok(())
    }

    /// End offset of the value in `slot`: the next entry's offset, or the
    /// file length for the last entry.
    fn value_end(&self, slot: usize) -> u32 {
        self.data_indexes
            .get(slot + 1)
            .map_or(self.file_size, |next| next.offset)
    }

    /// The LSM level holding this file.
    #[must_use]
    pub fn level(&self) -> usize {
        self.level
    }

    /// Maximum timestamp of any write contributing to this file.
    #[must_use]
    pub fn time_stamp(&self) -> TimeStamp {
        self.header.time_stamp
    }

    /// Smallest key in the file.
    #[must_use]
    pub fn min_key(&self) -> LsmKey {
        self.header.min_key
    }

    /// Largest key in the file.
    #[must_use]
    pub fn max_key(&self) -> LsmKey {
        self.header.max_key
    }

    /// Exact number of keys in the file.
    #[must_use]
    pub fn key_number(&self) -> u64 {
        self.header.key_number
    }

    /// All keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = LsmKey> + '_ {
        self.data_indexes.iter().map(|ix| ix.key)
    }

    /// The sparse index.
    #[must_use]
    pub fn data_indexes(&self) -> &[DataIndex] {
        &self.data_indexes
    }

    /// Path of the file on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for SsTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsTable")
            .field("level", &self.level)
            .field("time_stamp", &self.header.time_stamp)
            .field("key_number", &self.header.key_number)
            .field("min_key", &self.header.min_key)
            .field("max_key", &self.header.max_key)
            .field("path", &self.path)
            .finish()
    }
}
