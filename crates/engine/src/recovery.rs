//! Cold-start path: scanning the level directories and rebuilding the
//! engine's in-memory state from the SST files found there.

use anyhow::{Context, Result};
use config::{level_dir_name, TimeStamp, SST_EXT};
use sstable::SsTable;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Loads every SST under `dir`, walking `level-0`, `level-1`, … until the
/// first missing directory.
///
/// Each file's header, bloom filter and full sparse index are read into
/// memory. Files without the `.sst` extension are ignored. List ordering is
/// left to the caller (level 0 sorts by timestamp, deeper levels by
/// `minKey`).
///
/// # Errors
///
/// Returns an error on I/O failure or when any SST fails validation.
pub(crate) fn load_levels(dir: &Path) -> Result<Vec<Vec<SsTable>>> {
    let mut levels = Vec::new();

    loop {
        let level = levels.len();
        let level_dir = dir.join(level_dir_name(level));
        if !level_dir.is_dir() {
            break;
        }

        let mut tables = Vec::new();
        for entry in fs::read_dir(&level_dir)
            .with_context(|| format!("failed to scan {}", level_dir.display()))?
        {
            let path = entry?.path();
            if path.extension().map_or(false, |ext| ext == SST_EXT) {
                tables.push(SsTable::open(&path, level)?);
            }
        }
        debug!(level, tables = tables.len(), "loaded level");
        levels.push(tables);
    }

    Ok(levels)
}

/// The timestamp the engine restarts with: strictly above every timestamp
/// found on disk, or 1 for a fresh store.
pub(crate) fn next_time_stamp(levels: &[Vec<SsTable>]) -> TimeStamp {
    1 + levels
        .iter()
        .flatten()
        .map(SsTable::time_stamp)
        .max()
        .unwrap_or(0)
}
