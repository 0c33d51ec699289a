//! Search helpers over a deeper level's file list.
//!
//! Every list handled here is sorted by `minKey` with pairwise disjoint key
//! ranges, so binary search applies both to point lookups and to overlap
//! discovery.

use config::LsmKey;
use sstable::SsTable;

/// The single file of a sorted level whose key range contains `key`, if any.
///
/// Keys outside the level's overall span short-circuit without a search.
pub(crate) fn candidate(tables: &[SsTable], key: LsmKey) -> Option<&SsTable> {
    let first = tables.first()?;
    let last = tables.last()?;
    if key < first.min_key() || key > last.max_key() {
        return None;
    }

    // Rightmost file whose range starts at or before the key.
    let slot = tables.partition_point(|t| t.min_key() <= key);
    if slot == 0 {
        return None;
    }
    let table = &tables[slot - 1];
    (key <= table.max_key()).then_some(table)
}

/// The maximal contiguous run of files whose ranges intersect
/// `[min_key, max_key]`, as a half-open index range. Empty (`lo == hi`)
/// when nothing overlaps.
pub(crate) fn overlap_range(tables: &[SsTable], min_key: LsmKey, max_key: LsmKey) -> (usize, usize) {
    let lo = tables.partition_point(|t| t.max_key() < min_key);
    let hi = tables.partition_point(|t| t.min_key() <= max_key);
    (lo, hi.max(lo))
}

/// Position keeping the list sorted when inserting a file whose range starts
/// at `min_key`.
pub(crate) fn insert_position(tables: &[SsTable], min_key: LsmKey) -> usize {
    tables.partition_point(|t| t.min_key() < min_key)
}
