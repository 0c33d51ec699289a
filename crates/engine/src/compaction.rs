//! The overflow cascade and both compaction flavors.
//!
//! Level 0 compacts when it reaches exactly three files: the three are
//! merged with every overlapping level-1 file into fresh level-1 outputs.
//! Deeper levels compact when their population exceeds `2^(L+1)`: the
//! overflow files move down one at a time, each merged with its overlap in
//! the level below (or rewritten verbatim when nothing overlaps).
//!
//! Merging walks the sorted-unique key stream of all inputs (a min-heap over
//! the per-file key lists) and takes each key's value from a map built by
//! timestamp-ascending ingestion, so the newest write wins. Outputs are
//! split whenever the projected file size would pass the cap, and all
//! outputs inherit the maximum input timestamp -- compaction never advances
//! the engine clock.
//!
//! Tombstones are dropped exactly when the compaction targets the deepest
//! level that currently exists; anywhere else they are carried along to keep
//! shadowing older files.

use anyhow::{Context, Result};
use config::{
    is_tombstone, level_capacity, KvMap, LsmKey, LsmValue, TimeStamp, BLOOM_FILTER_SIZE,
    DATA_INDEX_SIZE, HEADER_SIZE, MAX_SSTABLE_SIZE,
};
use sstable::{KeyMerger, SsTable, SsTableWriter};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{levels, Engine};

impl Engine {
    /// Runs the overflow checks after a flush and at startup.
    ///
    /// Level 0 compacts on reaching three files. Then each deeper level is
    /// visited in ascending order; the first level at or under its capacity
    /// stops the cascade, since nothing below it can have grown.
    pub(crate) fn run_compaction_cascade(&mut self) -> Result<()> {
        if self.levels[0].len() == 3 {
            self.compact_level0()?;
        }

        let mut level = 1;
        while level < self.levels.len() {
            let count = self.levels[level].len();
            let capacity = level_capacity(level);
            if count <= capacity {
                break;
            }
            self.compact_into_next(level, count - capacity)?;
            level += 1;
        }
        Ok(())
    }

    /// Merges the three level-0 files and their level-1 overlap into fresh
    /// level-1 outputs.
    pub(crate) fn compact_level0(&mut self) -> Result<()> {
        anyhow::ensure!(
            self.levels[0].len() == 3,
            "level-0 compaction requires exactly three tables, found {}",
            self.levels[0].len()
        );
        self.ensure_level(1);

        let (min_key, max_key) = Self::key_span(&self.levels[0]);
        let (lo, hi) = levels::overlap_range(&self.levels[1], min_key, max_key);

        // Dropping tombstones is legal iff level 1 is currently the deepest.
        let drop_tombstones = self.levels.len() <= 2;
        let (out_ts, merger, data) = {
            let mut sources: Vec<&SsTable> = self.levels[0].iter().collect();
            sources.extend(self.levels[1][lo..hi].iter());
            gather(sources)?
        };

        let outputs = write_merged(&self.dir, 1, out_ts, merger, data, drop_tombstones)?;
        info!(
            overlap = hi - lo,
            outputs = outputs.len(),
            time_stamp = out_ts,
            drop_tombstones,
            "level-0 compaction into level 1"
        );

        let keep: HashSet<PathBuf> = outputs.iter().map(|t| t.path().to_path_buf()).collect();
        let replaced: Vec<SsTable> = self.levels[1].splice(lo..hi, outputs).collect();
        remove_files(&replaced, &keep)?;
        let flushed: Vec<SsTable> = self.levels[0].drain(..).collect();
        remove_files(&flushed, &keep)?;
        Ok(())
    }

    /// Moves `overflow` files from `level` into `level + 1`, one at a time.
    ///
    /// The compact set is the `overflow` files with the smallest
    /// `(timeStamp, minKey)`. Each is merged with its overlap below, or
    /// rewritten verbatim when nothing overlaps; the set is removed from
    /// this level and unlinked once every file has been processed.
    pub(crate) fn compact_into_next(&mut self, level: usize, overflow: usize) -> Result<()> {
        let target = level + 1;
        self.ensure_level(target);
        info!(level, overflow, "leveled compaction");

        let mut order: Vec<usize> = (0..self.levels[level].len()).collect();
        order.sort_by_key(|&slot| {
            let table = &self.levels[level][slot];
            (table.time_stamp(), table.min_key())
        });
        let compact_set: Vec<usize> = order.into_iter().take(overflow).collect();

        for &slot in &compact_set {
            let (min_key, max_key, upper_ts) = {
                let table = &self.levels[level][slot];
                (table.min_key(), table.max_key(), table.time_stamp())
            };
            let (lo, hi) = levels::overlap_range(&self.levels[target], min_key, max_key);

            if lo == hi {
                // Nothing overlaps below: the file's contents move down
                // unchanged, keeping their timestamp.
                let entries = {
                    let upper = &self.levels[level][slot];
                    let mut data = KvMap::new();
                    upper.read_values_into(&mut data)?;
                    upper
                        .keys()
                        .filter_map(|key| data.remove(&key).map(|value| (key, value)))
                        .collect::<Vec<_>>()
                };
                let table = SsTableWriter::write_from_entries(&self.dir, target, upper_ts, &entries)?;
                debug!(level, target, time_stamp = upper_ts, "moved table down without overlap");
                let position = levels::insert_position(&self.levels[target], table.min_key());
                self.levels[target].insert(position, table);
            } else {
                let drop_tombstones = self.levels.len() <= target + 1;
                let (out_ts, merger, data) = {
                    let mut sources: Vec<&SsTable> = vec![&self.levels[level][slot]];
                    sources.extend(self.levels[target][lo..hi].iter());
                    gather(sources)?
                };

                let outputs = write_merged(&self.dir, target, out_ts, merger, data, drop_tombstones)?;
                debug!(
                    level,
                    target,
                    overlap = hi - lo,
                    outputs = outputs.len(),
                    time_stamp = out_ts,
                    drop_tombstones,
                    "merged table into the level below"
                );

                let keep: HashSet<PathBuf> =
                    outputs.iter().map(|t| t.path().to_path_buf()).collect();
                let replaced: Vec<SsTable> = self.levels[target].splice(lo..hi, outputs).collect();
                remove_files(&replaced, &keep)?;
            }
        }

        // Retire the compact set from this level.
        let mut doomed_slots = compact_set;
        doomed_slots.sort_unstable();
        let mut doomed = Vec::with_capacity(doomed_slots.len());
        for slot in doomed_slots.into_iter().rev() {
            doomed.push(self.levels[level].remove(slot));
        }
        remove_files(&doomed, &HashSet::new())?;
        Ok(())
    }
}

/// Reads every input's values into one map (timestamp-ascending, so newer
/// sources overwrite older ones; on a timestamp tie the deeper file wins)
/// and builds the sorted-unique key stream across all inputs. Also reports
/// the maximum input timestamp, which every output inherits.
fn gather(mut sources: Vec<&SsTable>) -> Result<(TimeStamp, KeyMerger, KvMap)> {
    sources.sort_by_key(|t| (t.time_stamp(), t.level()));

    let mut data = KvMap::new();
    let mut out_ts: TimeStamp = 0;
    for table in &sources {
        out_ts = out_ts.max(table.time_stamp());
        table.read_values_into(&mut data)?;
    }

    let merger = KeyMerger::from_tables(&sources);
    Ok((out_ts, merger, data))
}

/// Emits the merged key stream into one or more SSTs at `target`, starting a
/// new file whenever the projected size would pass the cap.
fn write_merged(
    dir: &Path,
    target: usize,
    time_stamp: TimeStamp,
    merger: KeyMerger,
    mut data: KvMap,
    drop_tombstones: bool,
) -> Result<Vec<SsTable>> {
    let mut outputs = Vec::new();
    let mut entries: Vec<(LsmKey, LsmValue)> = Vec::new();
    let mut size = HEADER_SIZE + BLOOM_FILTER_SIZE;

    for key in merger {
        let Some(value) = data.remove(&key) else {
            continue;
        };
        if drop_tombstones && is_tombstone(&value) {
            continue;
        }

        let entry_size = DATA_INDEX_SIZE + value.len();
        if size + entry_size > MAX_SSTABLE_SIZE && !entries.is_empty() {
            outputs.push(SsTableWriter::write_from_entries(
                dir, target, time_stamp, &entries,
            )?);
            entries.clear();
            size = HEADER_SIZE + BLOOM_FILTER_SIZE;
        }
        size += entry_size;
        entries.push((key, value));
    }
    if !entries.is_empty() {
        outputs.push(SsTableWriter::write_from_entries(
            dir, target, time_stamp, &entries,
        )?);
    }
    Ok(outputs)
}

/// Unlinks the files behind retired handles. An output may reuse a retired
/// input's exact path when timestamps tie, so paths claimed by the new
/// tables are left alone.
fn remove_files(tables: &[SsTable], keep: &HashSet<PathBuf>) -> Result<()> {
    for table in tables {
        if keep.contains(table.path()) {
            continue;
        }
        fs::remove_file(table.path())
            .with_context(|| format!("failed to unlink {}", table.path().display()))?;
    }
    Ok(())
}
