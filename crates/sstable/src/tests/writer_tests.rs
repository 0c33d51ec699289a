use crate::tests::{entries_of, memtable_of};
use crate::{data_start, SsTableWriter};
use byteorder::{LittleEndian, ReadBytesExt};
use config::{BLOOM_FILTER_SIZE, HEADER_SIZE};
use std::fs;
use std::io::{Cursor, Seek, SeekFrom};
use tempfile::tempdir;

// -------------------- Publishing --------------------

#[test]
fn flush_publishes_canonical_name_in_level_0() {
    let dir = tempdir().unwrap();
    let mem = memtable_of(&[(2, b"bb"), (9, b"n"), (4, b"dddd")]);

    let table = SsTableWriter::write_from_memtable(dir.path(), 7, &mem).unwrap();

    let expected = dir.path().join("level-0").join("table-7-2-9.sst");
    assert_eq!(table.path(), expected);
    assert!(expected.is_file());
    // The temporary name must be gone.
    assert!(!dir.path().join("level-0").join("table-7.sst").exists());
}

#[test]
fn compaction_output_lands_in_its_level_directory() {
    let dir = tempdir().unwrap();
    let entries = entries_of(&[(10, b"x"), (20, b"y")]);

    let table = SsTableWriter::write_from_entries(dir.path(), 2, 5, &entries).unwrap();

    assert_eq!(table.level(), 2);
    assert!(dir.path().join("level-2").join("table-5-10-20.sst").is_file());
}

#[test]
fn empty_memtable_is_refused() {
    let dir = tempdir().unwrap();
    let mem = memtable_of(&[]);
    assert!(SsTableWriter::write_from_memtable(dir.path(), 1, &mem).is_err());
}

#[test]
fn out_of_order_entries_are_refused() {
    let dir = tempdir().unwrap();
    let entries = entries_of(&[(5, b"x"), (3, b"y")]);
    assert!(SsTableWriter::write_from_entries(dir.path(), 1, 1, &entries).is_err());
}

#[test]
fn duplicate_keys_are_refused() {
    let dir = tempdir().unwrap();
    let entries = entries_of(&[(5, b"x"), (5, b"y")]);
    assert!(SsTableWriter::write_from_entries(dir.path(), 1, 1, &entries).is_err());
}

// -------------------- Byte layout --------------------

#[test]
fn file_layout_matches_the_format() {
    let dir = tempdir().unwrap();
    let mem = memtable_of(&[(1, b"a"), (2, b"bb"), (3, b"ccc")]);

    let table = SsTableWriter::write_from_memtable(dir.path(), 42, &mem).unwrap();
    let bytes = fs::read(table.path()).unwrap();

    // Total size: header + bloom + 3 index entries + 6 value bytes.
    let expected_data_start = data_start(3);
    assert_eq!(bytes.len() as u64, expected_data_start + 6);

    let mut cursor = Cursor::new(&bytes);

    // Header: timeStamp, keyNumber, minKey, maxKey.
    assert_eq!(cursor.read_u64::<LittleEndian>().unwrap(), 42);
    assert_eq!(cursor.read_u64::<LittleEndian>().unwrap(), 3);
    assert_eq!(cursor.read_u64::<LittleEndian>().unwrap(), 1);
    assert_eq!(cursor.read_u64::<LittleEndian>().unwrap(), 3);

    // Index region sits right after the bloom filter.
    cursor
        .seek(SeekFrom::Start((HEADER_SIZE + BLOOM_FILTER_SIZE) as u64))
        .unwrap();
    let mut offsets = Vec::new();
    for expected_key in 1..=3u64 {
        assert_eq!(cursor.read_u64::<LittleEndian>().unwrap(), expected_key);
        offsets.push(cursor.read_u32::<LittleEndian>().unwrap());
    }
    assert_eq!(offsets[0] as u64, expected_data_start);
    assert_eq!(offsets[1], offsets[0] + 1);
    assert_eq!(offsets[2], offsets[1] + 2);

    // Data region: concatenated raw values in key order, no length prefixes.
    assert_eq!(&bytes[offsets[0] as usize..], b"abbccc");
}

#[test]
fn values_of_length_zero_are_representable() {
    let dir = tempdir().unwrap();
    let mem = memtable_of(&[(1, b""), (2, b"x")]);

    let table = SsTableWriter::write_from_memtable(dir.path(), 1, &mem).unwrap();

    assert_eq!(table.get(1).unwrap(), Some(Vec::new()));
    assert_eq!(table.get(2).unwrap(), Some(b"x".to_vec()));
}
