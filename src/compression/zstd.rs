// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Zstandard codec.
//!
//! Frames produced by `zstd::bulk::compress` record their content size, and
//! decoding goes through the streaming decoder so frames without a size
//! are handled as well.

use super::{Compressor, Decompressor, Granularity};
use crate::{BagError, Result};

/// Zstandard compressor and decompressor.
#[derive(Debug, Clone, Copy)]
pub struct ZstdCodec {
    file_level: i32,
}

impl ZstdCodec {
    /// Level used for whole files unless configured otherwise.
    pub const DEFAULT_FILE_LEVEL: i32 = 3;

    /// Level used for individual records, favouring latency.
    pub const MESSAGE_LEVEL: i32 = 1;

    /// Create a codec compressing files at the given level.
    pub fn new(file_level: i32) -> Self {
        Self { file_level }
    }

    /// Level used for whole files.
    pub fn file_level(&self) -> i32 {
        self.file_level
    }
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FILE_LEVEL)
    }
}

impl Compressor for ZstdCodec {
    fn identifier(&self) -> &str {
        "zstd"
    }

    fn compress_buffer(&self, data: &[u8], granularity: Granularity) -> Result<Vec<u8>> {
        let level = match granularity {
            Granularity::File => self.file_level,
            Granularity::Message => Self::MESSAGE_LEVEL,
        };
        ::zstd::bulk::compress(data, level).map_err(|e| BagError::codec("zstd", e.to_string()))
    }
}

impl Decompressor for ZstdCodec {
    fn identifier(&self) -> &str {
        "zstd"
    }

    fn decompress_buffer(&self, data: &[u8]) -> Result<Vec<u8>> {
        ::zstd::stream::decode_all(data).map_err(|e| BagError::codec("zstd", e.to_string()))
    }
}
