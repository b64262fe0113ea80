// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Compression and decompression of bag files and record payloads.
//!
//! A codec is a [`Compressor`] / [`Decompressor`] pair identified by a
//! compression-format string. The identifier is persisted in the bag
//! metadata so a reader can pick the matching decompressor through a
//! [`CompressionFactory`].
//!
//! Two granularities are supported:
//! - **file**: a closed storage file is read into memory, compressed and
//!   written next to the original with a codec-specific suffix
//! - **message**: each record payload is compressed on its own
//!
//! # Example
//!
//! ```rust
//! # fn main() -> robobag::Result<()> {
//! use robobag::compression::CompressionFactory;
//! use robobag::SerializedRecord;
//!
//! let factory = CompressionFactory::default();
//! let compressor = factory.create_compressor("zstd", None)?;
//! let decompressor = factory.create_decompressor("zstd")?;
//!
//! let record = SerializedRecord::new("/chatter", 1, vec![0x41; 1000]);
//! let compressed = compressor.compress_record(record);
//! let restored = decompressor.decompress_record(compressed)?;
//! assert_eq!(restored.payload, vec![0x41; 1000]);
//! # Ok(())
//! # }
//! ```

pub mod bz2;
pub mod lz4;
pub mod zstd;

pub use self::bz2::Bz2Codec;
pub use self::lz4::Lz4Codec;
pub use self::zstd::ZstdCodec;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::io::paths;
use crate::{BagError, Result, SerializedRecord};

/// What a buffer is being compressed as.
///
/// Codecs may trade speed for ratio differently per granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// A whole storage file
    File,
    /// A single record payload
    Message,
}

/// Compression half of a codec.
pub trait Compressor: Send + Sync {
    /// Stable codec name persisted as the bag's compression format.
    fn identifier(&self) -> &str;

    /// Suffix appended to compressed file names.
    fn extension(&self) -> &str {
        self.identifier()
    }

    /// Compress a buffer.
    fn compress_buffer(&self, data: &[u8], granularity: Granularity) -> Result<Vec<u8>>;

    /// Path the compressed version of `path` is written to.
    fn derive_compressed_path(&self, path: &Path) -> PathBuf {
        paths::append_suffix(path, self.extension())
    }

    /// Compress a file on disk, returning the compressed file's path.
    ///
    /// The source file is left in place.
    fn compress_file(&self, path: &Path) -> Result<PathBuf> {
        let start = Instant::now();
        let data = read_file(path)?;
        let compressed = self.compress_buffer(&data, Granularity::File)?;
        let compressed_path = self.derive_compressed_path(path);
        write_file(&compressed_path, &compressed)?;

        info!(
            codec = self.identifier(),
            path = %path.display(),
            size_before = data.len(),
            size_after = compressed.len(),
            ratio = ratio(data.len(), compressed.len()),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Compressed bag file"
        );
        Ok(compressed_path)
    }

    /// Compress a record payload.
    ///
    /// Best effort: if the codec fails, the record is returned unchanged.
    /// Whether a payload is compressed is known from the bag's compression
    /// mode, never from the payload bytes.
    fn compress_record(&self, mut record: SerializedRecord) -> SerializedRecord {
        match self.compress_buffer(&record.payload, Granularity::Message) {
            Ok(compressed) => {
                debug!(
                    codec = self.identifier(),
                    topic = %record.topic_name,
                    size_before = record.len(),
                    size_after = compressed.len(),
                    "Compressed record"
                );
                record.replace_payload(compressed);
                record
            }
            Err(e) => {
                warn!(
                    codec = self.identifier(),
                    topic = %record.topic_name,
                    error = %e,
                    "Unable to compress record, writing it uncompressed"
                );
                record
            }
        }
    }
}

/// Decompression half of a codec.
pub trait Decompressor: Send + Sync {
    /// Stable codec name, must match the bag's compression format.
    fn identifier(&self) -> &str;

    /// Suffix carried by compressed file names.
    fn extension(&self) -> &str {
        self.identifier()
    }

    /// Decompress a buffer, restoring the exact original bytes.
    fn decompress_buffer(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Path a compressed file decompresses to; inverse of
    /// [`Compressor::derive_compressed_path`].
    fn path_for_compressed_file(&self, path: &Path) -> Result<PathBuf> {
        paths::strip_suffix(path, self.extension()).ok_or_else(|| {
            BagError::codec(
                self.identifier(),
                format!(
                    "'{}' does not carry the '.{}' suffix",
                    path.display(),
                    self.extension()
                ),
            )
        })
    }

    /// Decompress a file on disk, returning the decompressed file's path.
    ///
    /// The compressed file is left in place.
    fn decompress_file(&self, path: &Path) -> Result<PathBuf> {
        let start = Instant::now();
        let decompressed_path = self.path_for_compressed_file(path)?;
        let data = read_file(path)?;
        let decompressed = self.decompress_buffer(&data)?;
        write_file(&decompressed_path, &decompressed)?;

        info!(
            codec = self.identifier(),
            path = %path.display(),
            size_before = data.len(),
            size_after = decompressed.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Decompressed bag file"
        );
        Ok(decompressed_path)
    }

    /// Decompress a record payload.
    fn decompress_record(&self, mut record: SerializedRecord) -> Result<SerializedRecord> {
        let decompressed = self.decompress_buffer(&record.payload).map_err(|e| match e {
            BagError::Codec { codec, message } => BagError::Codec {
                codec,
                message: format!("record on '{}': {message}", record.topic_name),
            },
            other => other,
        })?;
        record.replace_payload(decompressed);
        Ok(record)
    }
}

type CompressorCtor = Arc<dyn Fn(Option<i32>) -> Box<dyn Compressor> + Send + Sync>;
type DecompressorCtor = Arc<dyn Fn() -> Box<dyn Decompressor> + Send + Sync>;

#[derive(Clone)]
struct CodecEntry {
    compressor: CompressorCtor,
    decompressor: DecompressorCtor,
}

/// Lookup of codecs by compression-format identifier.
///
/// The default factory knows `zstd` (alias `zst`), `lz4` and `bz2` (alias
/// `bzip2`). Lookups are case-insensitive.
#[derive(Clone)]
pub struct CompressionFactory {
    codecs: HashMap<String, CodecEntry>,
}

impl Default for CompressionFactory {
    fn default() -> Self {
        let mut factory = Self::empty();
        factory.register(
            &["zstd", "zst"],
            |level| Box::new(ZstdCodec::new(level.unwrap_or(ZstdCodec::DEFAULT_FILE_LEVEL))),
            || Box::new(ZstdCodec::default()),
        );
        factory.register(&["lz4"], |_| Box::new(Lz4Codec), || Box::new(Lz4Codec));
        factory.register(
            &["bz2", "bzip2"],
            |level| Box::new(Bz2Codec::new(level.map(|l| l.clamp(1, 9) as u32))),
            || Box::new(Bz2Codec::default()),
        );
        factory
    }
}

impl CompressionFactory {
    /// Create a factory with no codecs.
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// Register a codec under one or more identifiers.
    ///
    /// The compressor constructor receives the optional file compression
    /// level from the compression options.
    pub fn register<C, D>(&mut self, identifiers: &[&str], compressor: C, decompressor: D)
    where
        C: Fn(Option<i32>) -> Box<dyn Compressor> + Send + Sync + 'static,
        D: Fn() -> Box<dyn Decompressor> + Send + Sync + 'static,
    {
        let entry = CodecEntry {
            compressor: Arc::new(compressor),
            decompressor: Arc::new(decompressor),
        };
        for id in identifiers {
            self.codecs.insert(id.to_lowercase(), entry.clone());
        }
    }

    /// Check if a compression format is known.
    pub fn supports(&self, format: &str) -> bool {
        self.codecs.contains_key(&format.to_lowercase())
    }

    /// All registered identifiers, sorted.
    pub fn formats(&self) -> Vec<String> {
        let mut formats: Vec<String> = self.codecs.keys().cloned().collect();
        formats.sort();
        formats
    }

    /// Create the compressor for a format.
    pub fn create_compressor(&self, format: &str, level: Option<i32>) -> Result<Box<dyn Compressor>> {
        self.codecs
            .get(&format.to_lowercase())
            .map(|entry| (entry.compressor)(level))
            .ok_or_else(|| BagError::unsupported_codec(format))
    }

    /// Create the decompressor for a format.
    pub fn create_decompressor(&self, format: &str) -> Result<Box<dyn Decompressor>> {
        self.codecs
            .get(&format.to_lowercase())
            .map(|entry| (entry.decompressor)())
            .ok_or_else(|| BagError::unsupported_codec(format))
    }
}

impl std::fmt::Debug for CompressionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompressionFactory")
            .field("formats", &self.formats())
            .finish()
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| BagError::io(format!("reading {}", path.display()), e))
}

fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    std::fs::write(path, data).map_err(|e| BagError::io(format!("writing {}", path.display()), e))
}

fn ratio(before: usize, after: usize) -> f64 {
    if after == 0 {
        0.0
    } else {
        before as f64 / after as f64
    }
}
