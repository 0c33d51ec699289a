use crate::Engine;
use anyhow::Result;
use config::{LsmKey, BLOOM_FILTER_SIZE, DATA_INDEX_SIZE, HEADER_SIZE, MAX_SSTABLE_SIZE, SST_EXT};
use std::fs;
use std::path::Path;

/// Payload capacity of one SST file: everything beside the header and the
/// bloom filter.
pub(crate) const PAYLOAD_BUDGET: usize = MAX_SSTABLE_SIZE - HEADER_SIZE - BLOOM_FILTER_SIZE;

/// Value size such that exactly `per_flush` equally-sized entries fit in one
/// file and one further entry triggers a flush.
pub(crate) fn fitting_value_len(per_flush: usize) -> usize {
    PAYLOAD_BUDGET / per_flush - DATA_INDEX_SIZE
}

/// Value that tops the flush projection up to exactly the cap, given the
/// payload bytes (`12 + value_len` per buffered put) already accounted for.
/// The put carrying it does not flush; any following put does.
pub(crate) fn cap_filler(used_payload: usize) -> Vec<u8> {
    vec![b'F'; PAYLOAD_BUDGET - used_payload - DATA_INDEX_SIZE]
}

/// Puts every key in `keys` with a value of `value_len` bytes of `tag`.
pub(crate) fn put_batch(
    engine: &mut Engine,
    keys: impl Iterator<Item = LsmKey>,
    tag: u8,
    value_len: usize,
) -> Result<()> {
    for key in keys {
        engine.put(key, vec![tag; value_len])?;
    }
    Ok(())
}

/// Number of `.sst` files under `dir`; 0 when the directory is missing.
pub(crate) fn sst_files_in(dir: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == SST_EXT))
        .count()
}

/// Asserts that a deeper level's list is `minKey`-sorted with pairwise
/// disjoint key ranges.
pub(crate) fn assert_sorted_disjoint(engine: &Engine, level: usize) {
    let tables = &engine.levels[level];
    for table in tables {
        assert!(table.min_key() <= table.max_key());
    }
    for pair in tables.windows(2) {
        assert!(
            pair[0].max_key() < pair[1].min_key(),
            "level {} ranges overlap: [{}, {}] and [{}, {}]",
            level,
            pair[0].min_key(),
            pair[0].max_key(),
            pair[1].min_key(),
            pair[1].max_key()
        );
    }
}

/// Asserts every file under the data root respects the size cap.
pub(crate) fn assert_files_within_cap(dir: &Path) {
    let mut level = 0;
    loop {
        let level_dir = dir.join(config::level_dir_name(level));
        if !level_dir.is_dir() {
            break;
        }
        for entry in fs::read_dir(&level_dir).unwrap() {
            let path = entry.unwrap().path();
            if path.extension().map_or(false, |ext| ext == SST_EXT) {
                let len = fs::metadata(&path).unwrap().len();
                assert!(
                    len <= MAX_SSTABLE_SIZE as u64,
                    "{} exceeds the file cap: {} bytes",
                    path.display(),
                    len
                );
            }
        }
        level += 1;
    }
}
