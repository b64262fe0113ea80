// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! LZ4 block codec.
//!
//! LZ4 blocks do not describe their decompressed size, so the size is
//! prepended as a little-endian `u32` (the layout `lz4_flex` and rosbag
//! chunks use).

use super::{Compressor, Decompressor, Granularity};
use crate::{BagError, Result};

/// Upper bound on LZ4's expansion ratio, used to reject absurd size prefixes
/// before allocating.
const MAX_EXPANSION: usize = 255;

/// LZ4 compressor and decompressor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Codec;

impl Compressor for Lz4Codec {
    fn identifier(&self) -> &str {
        "lz4"
    }

    fn compress_buffer(&self, data: &[u8], _granularity: Granularity) -> Result<Vec<u8>> {
        if data.len() > u32::MAX as usize {
            return Err(BagError::codec(
                "lz4",
                format!("input of {} bytes exceeds the 4 GiB block limit", data.len()),
            ));
        }
        Ok(lz4_flex::compress_prepend_size(data))
    }
}

impl Decompressor for Lz4Codec {
    fn identifier(&self) -> &str {
        "lz4"
    }

    fn decompress_buffer(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.len() < 4 {
            return Err(BagError::codec(
                "lz4",
                format!("frame of {} bytes is too short for a size prefix", data.len()),
            ));
        }
        let declared = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        let body = data.len() - 4;
        if declared > body.saturating_mul(MAX_EXPANSION).saturating_add(16) {
            return Err(BagError::codec(
                "lz4",
                format!("declared size {declared} is impossible for a {body} byte block"),
            ));
        }
        lz4_flex::decompress_size_prepended(data).map_err(|e| BagError::codec("lz4", e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SerializedRecord;

    #[test]
    fn test_record_round_trip() {
        let payload: Vec<u8> = b"lz4 payload ".repeat(50);
        let record = SerializedRecord::new("/scan", 99, payload.clone());
        let compressed = Lz4Codec.compress_record(record);
        assert_ne!(compressed.payload, payload);
        let restored = Lz4Codec.decompress_record(compressed).unwrap();
        assert_eq!(restored.payload, payload);
        assert_eq!(restored.timestamp, 99);
    }

    #[test]
    fn test_short_frame_is_codec_error() {
        assert!(matches!(
            Lz4Codec.decompress_buffer(&[1, 2]),
            Err(BagError::Codec { .. })
        ));
    }

    #[test]
    fn test_impossible_size_prefix_is_rejected() {
        // Claims ~1 GiB from a 3 byte body.
        let frame = [0x41, 0x41, 0x41, 0x41, 1, 2, 3];
        assert!(matches!(
            Lz4Codec.decompress_buffer(&frame),
            Err(BagError::Codec { .. })
        ));
    }

    #[test]
    fn test_corrupt_body_is_codec_error() {
        let mut frame = Lz4Codec
            .compress_buffer(&[9u8; 512], Granularity::Message)
            .unwrap();
        let last = frame.len() - 1;
        frame.truncate(last);
        assert!(Lz4Codec.decompress_buffer(&frame).is_err());
    }

    #[test]
    fn test_compressed_path_suffix() {
        let path = std::path::Path::new("bag/bag_2.rec");
        let compressed = Lz4Codec.derive_compressed_path(path);
        assert_eq!(compressed, std::path::PathBuf::from("bag/bag_2.rec.lz4"));
        assert_eq!(Lz4Codec.path_for_compressed_file(&compressed).unwrap(), path);
    }
}
