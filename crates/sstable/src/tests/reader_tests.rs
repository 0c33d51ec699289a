use crate::tests::memtable_of;
use crate::{SsTable, SsTableWriter};
use config::KvMap;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn written_table(dir: &std::path::Path) -> PathBuf {
    let mem = memtable_of(&[(10, b"ten"), (20, b"twenty"), (30, b"thirty")]);
    SsTableWriter::write_from_memtable(dir, 3, &mem)
        .unwrap()
        .path()
        .to_path_buf()
}

// -------------------- Open / metadata --------------------

#[test]
fn open_restores_metadata() {
    let dir = tempdir().unwrap();
    let path = written_table(dir.path());

    let table = SsTable::open(&path, 0).unwrap();

    assert_eq!(table.level(), 0);
    assert_eq!(table.time_stamp(), 3);
    assert_eq!(table.key_number(), 3);
    assert_eq!(table.min_key(), 10);
    assert_eq!(table.max_key(), 30);
    assert_eq!(table.keys().collect::<Vec<_>>(), vec![10, 20, 30]);
}

// -------------------- Point reads --------------------

#[test]
fn get_returns_stored_values() {
    let dir = tempdir().unwrap();
    let path = written_table(dir.path());
    let table = SsTable::open(&path, 0).unwrap();

    assert_eq!(table.get(10).unwrap(), Some(b"ten".to_vec()));
    assert_eq!(table.get(20).unwrap(), Some(b"twenty".to_vec()));
}

#[test]
fn get_at_max_key_reads_to_end_of_file() {
    let dir = tempdir().unwrap();
    let path = written_table(dir.path());
    let table = SsTable::open(&path, 0).unwrap();

    assert_eq!(table.get(30).unwrap(), Some(b"thirty".to_vec()));
}

#[test]
fn get_missing_key_is_none() {
    let dir = tempdir().unwrap();
    let path = written_table(dir.path());
    let table = SsTable::open(&path, 0).unwrap();

    assert_eq!(table.get(15).unwrap(), None);
    assert_eq!(table.get(31).unwrap(), None);
    assert_eq!(table.get(0).unwrap(), None);
}

#[test]
fn read_values_into_streams_everything() {
    let dir = tempdir().unwrap();
    let path = written_table(dir.path());
    let table = SsTable::open(&path, 0).unwrap();

    let mut out = KvMap::new();
    table.read_values_into(&mut out).unwrap();

    assert_eq!(out.len(), 3);
    assert_eq!(out[&10], b"ten".to_vec());
    assert_eq!(out[&20], b"twenty".to_vec());
    assert_eq!(out[&30], b"thirty".to_vec());
}

#[test]
fn read_values_into_overwrites_older_entries() {
    let dir = tempdir().unwrap();
    let old = SsTableWriter::write_from_memtable(dir.path(), 1, &memtable_of(&[(10, b"old")]))
        .unwrap();
    let new = SsTableWriter::write_from_memtable(dir.path(), 2, &memtable_of(&[(10, b"new")]))
        .unwrap();

    let mut out = KvMap::new();
    old.read_values_into(&mut out).unwrap();
    new.read_values_into(&mut out).unwrap();

    assert_eq!(out[&10], b"new".to_vec());
}

// -------------------- Corruption --------------------

#[test]
fn truncated_file_is_rejected() {
    let dir = tempdir().unwrap();
    let path = written_table(dir.path());

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..100]).unwrap();

    assert!(SsTable::open(&path, 0).is_err());
}

#[test]
fn zero_key_number_is_rejected() {
    let dir = tempdir().unwrap();
    let path = written_table(dir.path());

    let mut bytes = fs::read(&path).unwrap();
    // keyNumber is the second u64 of the header.
    bytes[8..16].fill(0);
    fs::write(&path, &bytes).unwrap();

    assert!(SsTable::open(&path, 0).is_err());
}

#[test]
fn key_number_inconsistent_with_file_size_is_rejected() {
    let dir = tempdir().unwrap();
    let path = written_table(dir.path());

    let mut bytes = fs::read(&path).unwrap();
    bytes[8..16].copy_from_slice(&1_000_000u64.to_le_bytes());
    fs::write(&path, &bytes).unwrap();

    assert!(SsTable::open(&path, 0).is_err());
}

#[test]
fn header_min_key_disagreeing_with_index_is_rejected() {
    let dir = tempdir().unwrap();
    let path = written_table(dir.path());

    let mut bytes = fs::read(&path).unwrap();
    // minKey is the third u64 of the header; the index still starts at 10.
    bytes[16..24].copy_from_slice(&11u64.to_le_bytes());
    fs::write(&path, &bytes).unwrap();

    assert!(SsTable::open(&path, 0).is_err());
}
