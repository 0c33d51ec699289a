//! Read path: `get()`.
//!
//! Point lookups check the memtable first (freshest data, tombstones
//! included), then every level-0 SST, then at most one binary-searched
//! candidate file per deeper level. Version conflicts are resolved by the
//! file timestamp: the largest one wins. The tombstone sentinel is
//! interpreted last, so a deletion shadows older live values wherever they
//! sit.

use anyhow::Result;
use config::{is_tombstone, LsmKey, LsmValue, TimeStamp};

use crate::{levels, Engine};

impl Engine {
    /// Looks up a key. The empty value means "absent or deleted".
    ///
    /// # Errors
    ///
    /// Returns an error if reading any SST fails.
    pub fn get(&self, key: LsmKey) -> Result<LsmValue> {
        // 1. The memtable. A tombstone here hides everything below; an empty
        //    stored value is indistinguishable from absence and falls
        //    through to disk.
        if let Some(value) = self.mem.get(key) {
            if is_tombstone(value) {
                return Ok(LsmValue::new());
            }
            if !value.is_empty() {
                return Ok(value.to_vec());
            }
        }

        let mut best = LsmValue::new();
        let mut best_ts: TimeStamp = 0;

        // 2. Level 0: ranges may overlap, so every file is asked and the
        //    newest answer kept.
        for table in self.levels[0].iter().rev() {
            if table.time_stamp() <= best_ts {
                continue;
            }
            if let Some(value) = table.get(key)? {
                if !value.is_empty() {
                    best_ts = table.time_stamp();
                    best = value;
                }
            }
        }

        // 3. Deeper levels only matter when level 0 had no answer; their
        //    disjoint sorted ranges pin down one candidate file each.
        if best.is_empty() {
            for level in self.levels.iter().skip(1) {
                if let Some(table) = levels::candidate(level, key) {
                    if table.time_stamp() <= best_ts {
                        continue;
                    }
                    if let Some(value) = table.get(key)? {
                        if !value.is_empty() {
                            best_ts = table.time_stamp();
                            best = value;
                        }
                    }
                }
            }
        }

        // 4. A winning tombstone means the key is deleted.
        if is_tombstone(&best) {
            return Ok(LsmValue::new());
        }
        Ok(best)
    }
}
