// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! End-to-end round trips: everything written is read back unchanged and
//! in order, whatever the split size and compression settings.

mod common;

use common::{json_topic, read_bag, temp_bag, write_bag};
use proptest::prelude::*;
use robobag::io::metadata_io::{JsonMetadataIo, MetadataIo};
use robobag::{CompressionMode, CompressionOptions, SerializedRecord, Writer};

fn writer_for(mode: CompressionMode, format: &str) -> Writer {
    if mode == CompressionMode::None {
        Writer::new()
    } else {
        Writer::with_compression(CompressionOptions::new(format, mode)).unwrap()
    }
}

fn mode_strategy() -> impl Strategy<Value = (CompressionMode, &'static str)> {
    prop_oneof![
        Just((CompressionMode::None, "")),
        Just((CompressionMode::File, "zstd")),
        Just((CompressionMode::File, "lz4")),
        Just((CompressionMode::Message, "zstd")),
        Just((CompressionMode::Message, "bz2")),
    ]
}

fn records_strategy() -> impl Strategy<Value = Vec<SerializedRecord>> {
    proptest::collection::vec(
        (0usize..3, 1u64..1_000, proptest::collection::vec(any::<u8>(), 0..300)),
        1..40,
    )
    .prop_map(|items| {
        let mut timestamp = 0;
        items
            .into_iter()
            .map(|(topic, step, payload)| {
                timestamp += step;
                SerializedRecord::new(format!("/t{topic}"), timestamp, payload)
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_bag_round_trip(
        records in records_strategy(),
        (mode, format) in mode_strategy(),
        max_bagfile_size in prop_oneof![Just(0u64), 200u64..2_000],
    ) {
        let (_dir, bag) = temp_bag("prop");
        let topics: Vec<_> = (0..3).map(|i| json_topic(&format!("/t{i}"))).collect();
        let mut writer = writer_for(mode, format);
        write_bag(&mut writer, &bag, max_bagfile_size, &topics, &records);

        let metadata = JsonMetadataIo.read_metadata(&bag).unwrap();
        prop_assert_eq!(metadata.message_count, records.len() as u64);
        prop_assert_eq!(metadata.starting_time, records[0].timestamp);
        prop_assert_eq!(
            metadata.end_time(),
            records.last().map(|r| r.timestamp)
        );
        let per_file: u64 = metadata.files.iter().map(|f| f.message_count).sum();
        prop_assert_eq!(per_file, records.len() as u64);

        prop_assert_eq!(read_bag(&bag), records);
    }
}

#[test]
fn test_empty_bag_round_trip() {
    let (_dir, bag) = temp_bag("empty");
    let mut writer = Writer::new();
    write_bag(&mut writer, &bag, 0, &[json_topic("/a")], &[]);

    let metadata = JsonMetadataIo.read_metadata(&bag).unwrap();
    assert_eq!(metadata.message_count, 0);
    assert_eq!(metadata.starting_time, 0);
    assert_eq!(metadata.duration, 0);
    assert!(read_bag(&bag).is_empty());
}
