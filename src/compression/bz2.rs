// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! BZ2 codec.

use std::io::{Read, Write};

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use bzip2::Compression;

use super::{Compressor, Decompressor, Granularity};
use crate::{BagError, Result};

/// BZ2 compressor and decompressor.
#[derive(Debug, Clone, Copy)]
pub struct Bz2Codec {
    level: u32,
}

impl Bz2Codec {
    /// Create a codec; `None` selects the library default block size.
    pub fn new(level: Option<u32>) -> Self {
        Self {
            level: level.unwrap_or_else(|| Compression::default().level()),
        }
    }
}

impl Default for Bz2Codec {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Compressor for Bz2Codec {
    fn identifier(&self) -> &str {
        "bz2"
    }

    fn compress_buffer(&self, data: &[u8], _granularity: Granularity) -> Result<Vec<u8>> {
        let mut encoder = BzEncoder::new(Vec::new(), Compression::new(self.level));
        encoder
            .write_all(data)
            .and_then(|_| encoder.finish())
            .map_err(|e| BagError::codec("bz2", e.to_string()))
    }
}

impl Decompressor for Bz2Codec {
    fn identifier(&self) -> &str {
        "bz2"
    }

    fn decompress_buffer(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = BzDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| BagError::codec("bz2", e.to_string()))?;
        Ok(decompressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SerializedRecord;

    #[test]
    fn test_record_round_trip() {
        let payload = b"bz2 likes repetition ".repeat(40);
        let record = SerializedRecord::new("/tf", 3, payload.clone());
        let compressed = Bz2Codec::default().compress_record(record);
        assert!(compressed.len() < payload.len());
        let restored = Bz2Codec::default().decompress_record(compressed).unwrap();
        assert_eq!(restored.payload, payload);
    }

    #[test]
    fn test_garbage_is_codec_error() {
        let err = Bz2Codec::default()
            .decompress_buffer(b"this is not a bzip2 stream")
            .unwrap_err();
        assert!(matches!(err, BagError::Codec { .. }));
    }

    #[test]
    fn test_level_is_configurable() {
        let fast = Bz2Codec::new(Some(1));
        let data = vec![5u8; 10_000];
        let compressed = fast.compress_buffer(&data, Granularity::File).unwrap();
        assert_eq!(fast.decompress_buffer(&compressed).unwrap(), data);
    }
}
