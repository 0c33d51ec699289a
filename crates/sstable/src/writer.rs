use anyhow::{Context, Result};
use bloom::BloomFilter;
use config::{level_dir_name, sst_file_name, tmp_file_name, LsmKey, LsmValue, TimeStamp};
use memtable::MemTable;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::format::{data_start, DataIndex, SstHeader};
use crate::reader::SsTable;

/// Writes SSTable files.
///
/// The writer is stateless -- all work happens inside the two static entry
/// points. A write is published atomically: data goes to the temporary name
/// `table-<timeStamp>.sst`, is fsynced, and only then renamed to the
/// canonical `table-<timeStamp>-<minKey>-<maxKey>.sst`.
pub struct SsTableWriter {}

impl SsTableWriter {
    /// Flushes `mem` to a new level-0 SSTable under `data_dir/level-0/`.
    ///
    /// Tombstone entries are written like any other value; they are only
    /// retired by a deepest-level compaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the memtable is empty (an empty SSTable is
    /// invalid) or on any I/O failure.
    pub fn write_from_memtable(
        data_dir: &Path,
        time_stamp: TimeStamp,
        mem: &MemTable,
    ) -> Result<SsTable> {
        let entries: Vec<(LsmKey, &[u8])> = mem.iter().collect();
        Self::write_internal(data_dir, 0, time_stamp, &entries)
    }

    /// Writes a compaction output at the given level.
    ///
    /// `entries` must be in strictly ascending key order; the caller is
    /// responsible for deduplication and for keeping the projected file size
    /// within the cap.
    pub fn write_from_entries(
        data_dir: &Path,
        level: usize,
        time_stamp: TimeStamp,
        entries: &[(LsmKey, LsmValue)],
    ) -> Result<SsTable> {
        let refs: Vec<(LsmKey, &[u8])> = entries.iter().map(|(k, v)| (*k, v.as_slice())).collect();
        Self::write_internal(data_dir, level, time_stamp, &refs)
    }

    fn write_internal(
        data_dir: &Path,
        level: usize,
        time_stamp: TimeStamp,
        entries: &[(LsmKey, &[u8])],
    ) -> Result<SsTable> {
        anyhow::ensure!(!entries.is_empty(), "refusing to write an empty SSTable");

        let level_dir = data_dir.join(level_dir_name(level));
        fs::create_dir_all(&level_dir)
            .with_context(|| format!("failed to create {}", level_dir.display()))?;

        // Build the bloom filter and the sparse index up front; with the key
        // count known, every value offset is known before the first byte is
        // written, so the file goes out in one sequential pass.
        let key_number = entries.len() as u64;
        let mut bloom = BloomFilter::new();
        let mut data_indexes = Vec::with_capacity(entries.len());
        let mut offset = u32::try_from(data_start(key_number))
            .context("data region offset exceeds the u32 offset space")?;

        let mut prev_key: Option<LsmKey> = None;
        for (key, value) in entries {
            anyhow::ensure!(
                prev_key.map_or(true, |p| p < *key),
                "SSTable entries must be strictly ascending by key"
            );
            prev_key = Some(*key);

            bloom.insert(*key);
            data_indexes.push(DataIndex { key: *key, offset });
            offset = offset
                .checked_add(value.len() as u32)
                .context("value bytes exceed the u32 offset space")?;
        }
        let file_size = offset;

        let header = SstHeader {
            time_stamp,
            key_number,
            min_key: entries[0].0,
            max_key: entries[entries.len() - 1].0,
        };

        // Write under the temporary name first.
        let tmp_path = level_dir.join(tmp_file_name(time_stamp));
        let raw_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .with_context(|| format!("failed to open {}", tmp_path.display()))?;
        let mut file = BufWriter::new(raw_file);

        header.write_to(&mut file)?;
        bloom.write_to(&mut file)?;
        for index in &data_indexes {
            index.write_to(&mut file)?;
        }
        for (_, value) in entries {
            file.write_all(value)?;
        }

        file.flush()?;
        file.into_inner()?.sync_all()?;

        // Publish under the canonical name.
        let final_path = level_dir.join(sst_file_name(time_stamp, header.min_key, header.max_key));
        fs::rename(&tmp_path, &final_path)
            .with_context(|| format!("failed to publish {}", final_path.display()))?;

        Ok(SsTable::from_parts(
            level,
            header,
            bloom,
            data_indexes,
            final_path,
            file_size,
        ))
    }
}
