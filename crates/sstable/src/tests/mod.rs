mod reader_tests;
mod writer_tests;

use config::{LsmKey, LsmValue};
use memtable::MemTable;

/// Builds a memtable holding `pairs` verbatim.
pub(crate) fn memtable_of(pairs: &[(LsmKey, &[u8])]) -> MemTable {
    let mut mem = MemTable::new();
    for (key, value) in pairs {
        mem.put(*key, value.to_vec());
    }
    mem
}

/// Owned entries, for `write_from_entries`.
pub(crate) fn entries_of(pairs: &[(LsmKey, &[u8])]) -> Vec<(LsmKey, LsmValue)> {
    pairs.iter().map(|(k, v)| (*k, v.to_vec())).collect()
}
