//! Fixed-layout metadata records of the SST file format.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use config::{LsmKey, TimeStamp, BLOOM_FILTER_SIZE, DATA_INDEX_SIZE, HEADER_SIZE};
use std::io::{self, Read, Write};

/// The 32-byte file header: four little-endian `u64` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SstHeader {
    /// Maximum timestamp of any write contributing to this file.
    pub time_stamp: TimeStamp,
    /// Exact number of keys in the file. Never zero in a valid file.
    pub key_number: u64,
    /// Smallest key, equal to the first index entry's key.
    pub min_key: LsmKey,
    /// Largest key, equal to the last index entry's key.
    pub max_key: LsmKey,
}

impl SstHeader {
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u64::<LittleEndian>(self.time_stamp)?;
        w.write_u64::<LittleEndian>(self.key_number)?;
        w.write_u64::<LittleEndian>(self.min_key)?;
        w.write_u64::<LittleEndian>(self.max_key)?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            time_stamp: r.read_u64::<LittleEndian>()?,
            key_number: r.read_u64::<LittleEndian>()?,
            min_key: r.read_u64::<LittleEndian>()?,
            max_key: r.read_u64::<LittleEndian>()?,
        })
    }
}

/// One sparse index entry: a key and the absolute file offset of its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataIndex {
    pub key: LsmKey,
    pub offset: u32,
}

impl DataIndex {
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u64::<LittleEndian>(self.key)?;
        w.write_u32::<LittleEndian>(self.offset)?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            key: r.read_u64::<LittleEndian>()?,
            offset: r.read_u32::<LittleEndian>()?,
        })
    }
}

/// Absolute offset where the data region begins for a file of `key_number`
/// keys: header + bloom filter + sparse index.
#[must_use]
pub fn data_start(key_number: u64) -> u64 {
    (HEADER_SIZE + BLOOM_FILTER_SIZE) as u64 + key_number * DATA_INDEX_SIZE as u64
}
