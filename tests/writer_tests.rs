// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Writer integration tests.
//!
//! Tests cover:
//! - Time bounds and per-topic counts in the persisted metadata
//! - Split placement relative to the size threshold
//! - File and message compression of split bags
//! - Error handling for misuse

mod common;

use common::{filled_record, json_record, json_topic, read_rec_file, temp_bag, timestamps, write_bag};
use robobag::io::metadata_io::{JsonMetadataIo, MetadataIo};
use robobag::io::paths;
use robobag::{
    BagError, CompressionMode, CompressionOptions, ConverterOptions, StorageOptions, Writer,
};

// ============================================================================
// Metadata
// ============================================================================

#[test]
fn test_time_bounds_track_min_and_max() {
    let (_dir, bag) = temp_bag("bounds");
    let mut writer = Writer::new();
    writer
        .open(&StorageOptions::new(&bag), &ConverterOptions::default())
        .unwrap();
    writer.create_topic(&json_topic("/a")).unwrap();

    let stamps = [500u64, 700, 900, 1_000, 1_500];
    for (n, ts) in stamps.iter().enumerate() {
        writer.write(json_record("/a", *ts)).unwrap();
        assert_eq!(writer.metadata().starting_time, stamps[0]);
        assert_eq!(writer.metadata().duration, stamps[n] - stamps[0]);
    }
    writer.close().unwrap();

    let metadata = JsonMetadataIo.read_metadata(&bag).unwrap();
    assert_eq!(metadata.starting_time, 500);
    assert_eq!(metadata.duration, 1_000);
    assert_eq!(metadata.end_time(), Some(1_500));
}

#[test]
fn test_topic_counts_persisted() {
    let (_dir, bag) = temp_bag("counts");
    let mut writer = Writer::new();
    write_bag(
        &mut writer,
        &bag,
        0,
        &[json_topic("/a"), json_topic("/b")],
        &[json_record("/a", 1), json_record("/b", 2), json_record("/a", 3)],
    );

    let metadata = JsonMetadataIo.read_metadata(&bag).unwrap();
    assert_eq!(metadata.message_count, 3);
    assert_eq!(metadata.topic("/a").unwrap().message_count, 2);
    assert_eq!(metadata.topic("/b").unwrap().message_count, 1);
    assert_eq!(metadata.relative_file_paths, vec!["counts_0.rec"]);
    assert_eq!(metadata.files[0].message_count, 3);
    assert!(metadata.bag_size > 0);
}

// ============================================================================
// Splitting
// ============================================================================

#[test]
fn test_split_places_triggering_write_in_new_file() {
    let (_dir, bag) = temp_bag("split");
    let mut writer = Writer::new();
    writer
        .open(
            &StorageOptions::new(&bag).with_max_bagfile_size(200),
            &ConverterOptions::default(),
        )
        .unwrap();
    writer.create_topic(&json_topic("/a")).unwrap();

    let mut k = None;
    for ts in 1..=10u64 {
        writer.write(filled_record("/a", ts, b'x', 50)).unwrap();
        if k.is_none() && writer.metadata().relative_file_paths.len() == 2 {
            k = Some(ts);
        }
    }
    writer.close().unwrap();
    let k = k.expect("bag never split");
    assert!(k > 1);

    let metadata = JsonMetadataIo.read_metadata(&bag).unwrap();
    let first = read_rec_file(&paths::resolve(&bag, &metadata.relative_file_paths[0]));
    let second = read_rec_file(&paths::resolve(&bag, &metadata.relative_file_paths[1]));
    assert_eq!(timestamps(&first), (1..k).collect::<Vec<_>>());
    assert_eq!(second.first().map(|r| r.timestamp), Some(k));
    assert_eq!(metadata.files[0].message_count, k - 1);
}

#[test]
fn test_no_split_when_disabled() {
    let (_dir, bag) = temp_bag("nosplit");
    let mut writer = Writer::new();
    let records: Vec<_> = (1..=100).map(|ts| filled_record("/a", ts, 0, 1024)).collect();
    write_bag(&mut writer, &bag, 0, &[json_topic("/a")], &records);
    assert_eq!(writer.metadata().relative_file_paths.len(), 1);
}

#[test]
fn test_split_files_keep_topic_definitions() {
    let (_dir, bag) = temp_bag("topics");
    let mut writer = Writer::new();
    let records: Vec<_> = (1..=6).map(|ts| filled_record("/a", ts, 1, 100)).collect();
    write_bag(&mut writer, &bag, 150, &[json_topic("/a")], &records);

    let metadata = JsonMetadataIo.read_metadata(&bag).unwrap();
    assert!(metadata.relative_file_paths.len() > 1);
    for relative in &metadata.relative_file_paths {
        let records = read_rec_file(&paths::resolve(&bag, relative));
        assert!(records.iter().all(|r| r.topic_name == "/a"));
    }
}

// ============================================================================
// Compression
// ============================================================================

#[test]
fn test_file_mode_replaces_every_file() {
    let (_dir, bag) = temp_bag("zfile");
    let mut writer =
        Writer::with_compression(CompressionOptions::new("zstd", CompressionMode::File)).unwrap();
    let records: Vec<_> = (1..=8).map(|ts| filled_record("/a", ts, b'z', 100)).collect();
    write_bag(&mut writer, &bag, 300, &[json_topic("/a")], &records);

    let metadata = JsonMetadataIo.read_metadata(&bag).unwrap();
    assert_eq!(metadata.compression_format, "zstd");
    assert_eq!(metadata.compression_mode, CompressionMode::File);
    assert!(metadata.relative_file_paths.len() > 1);
    for (i, relative) in metadata.relative_file_paths.iter().enumerate() {
        assert_eq!(relative, &format!("zfile_{i}.rec.zstd"));
        assert!(bag.join(relative).exists());
        assert!(!bag.join(format!("zfile_{i}.rec")).exists());
        assert_eq!(metadata.files[i].path, *relative);
    }
}

#[test]
fn test_message_mode_compresses_payloads_in_place() {
    let (_dir, bag) = temp_bag("zmsg");
    let mut writer =
        Writer::with_compression(CompressionOptions::new("lz4", CompressionMode::Message)).unwrap();
    write_bag(
        &mut writer,
        &bag,
        0,
        &[json_topic("/a")],
        &[filled_record("/a", 1, 0x41, 1000)],
    );

    let metadata = JsonMetadataIo.read_metadata(&bag).unwrap();
    assert_eq!(metadata.relative_file_paths, vec!["zmsg_0.rec"]);
    let stored = read_rec_file(&bag.join("zmsg_0.rec"));
    assert_eq!(stored.len(), 1);
    assert!(stored[0].payload.len() < 1000);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_write_before_open() {
    let mut writer = Writer::new();
    assert!(matches!(
        writer.write(json_record("/a", 1)),
        Err(BagError::NotOpen { .. })
    ));
}

#[test]
fn test_write_unregistered_topic() {
    let (_dir, bag) = temp_bag("unknown");
    let mut writer = Writer::new();
    writer
        .open(&StorageOptions::new(&bag), &ConverterOptions::default())
        .unwrap();
    let err = writer.write(json_record("/nope", 1)).unwrap_err();
    assert!(matches!(err, BagError::UnknownTopic { .. }));
    assert!(err.is_precondition());
}

#[test]
fn test_writer_reusable_after_close() {
    let (dir, first) = temp_bag("first");
    let second = dir.path().join("second");
    let mut writer = Writer::new();
    write_bag(&mut writer, &first, 0, &[json_topic("/a")], &[json_record("/a", 1)]);
    write_bag(&mut writer, &second, 0, &[json_topic("/b")], &[json_record("/b", 2)]);

    let metadata = JsonMetadataIo.read_metadata(&second).unwrap();
    assert_eq!(metadata.message_count, 1);
    assert!(metadata.topic("/a").is_none());
}
