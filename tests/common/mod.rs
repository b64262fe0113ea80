// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use robobag::io::formats::rec::RecReader;
use robobag::io::paths;
use robobag::io::traits::Storage;
use robobag::{
    ConverterOptions, SequentialReader, SerializedRecord, StorageOptions, TopicMetadata, Writer,
};
use tempfile::TempDir;

/// Temporary directory and the bag path inside it.
///
/// The bag directory itself is created by the writer.
pub fn temp_bag(name: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let bag = dir.path().join(name);
    (dir, bag)
}

/// JSON topic with a fixed message type.
pub fn json_topic(name: &str) -> TopicMetadata {
    TopicMetadata::new(name, "std_msgs/msg/String", "json")
}

/// Record whose JSON payload is its timestamp.
pub fn json_record(topic: &str, timestamp: u64) -> SerializedRecord {
    SerializedRecord::new(topic, timestamp, timestamp.to_string().into_bytes())
}

/// Record with a payload of `size` copies of `byte`.
pub fn filled_record(topic: &str, timestamp: u64, byte: u8, size: usize) -> SerializedRecord {
    SerializedRecord::new(topic, timestamp, vec![byte; size])
}

/// Open `writer` on `bag`, register `topics` and write `records`, then close.
pub fn write_bag(
    writer: &mut Writer,
    bag: &Path,
    max_bagfile_size: u64,
    topics: &[TopicMetadata],
    records: &[SerializedRecord],
) {
    writer
        .open(
            &StorageOptions::new(bag).with_max_bagfile_size(max_bagfile_size),
            &ConverterOptions::default(),
        )
        .expect("open writer");
    for topic in topics {
        writer.create_topic(topic).expect("create topic");
    }
    for record in records {
        writer.write(record.clone()).expect("write record");
    }
    writer.close().expect("close writer");
}

/// Read every record of a bag.
pub fn read_bag(bag: &Path) -> Vec<SerializedRecord> {
    read_bag_as(bag, &ConverterOptions::default())
}

/// Read every record of a bag with the given converter options.
pub fn read_bag_as(bag: &Path, converter: &ConverterOptions) -> Vec<SerializedRecord> {
    let mut reader = SequentialReader::new();
    reader
        .open(&StorageOptions::new(bag), converter)
        .expect("open reader");
    let records = reader
        .records()
        .collect::<robobag::Result<Vec<_>>>()
        .expect("read records");
    reader.close().expect("close reader");
    records
}

/// Read the records of one uncompressed `.rec` file directly.
pub fn read_rec_file(path: &Path) -> Vec<SerializedRecord> {
    let mut storage =
        RecReader::open(&paths::strip_storage_extension(path)).expect("open rec file");
    let mut records = Vec::new();
    while storage.has_next().expect("has_next") {
        records.push(storage.read_next().expect("read_next"));
    }
    records
}

/// Timestamps of a list of records.
pub fn timestamps(records: &[SerializedRecord]) -> Vec<u64> {
    records.iter().map(|r| r.timestamp).collect()
}
