// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Robobag
//!
//! Append-only message bags for robotics recordings.
//!
//! A bag is a directory holding one or more storage files and a
//! `metadata.json` describing them. Records are timestamped, opaque
//! payloads published on named topics. The library provides:
//! - the [`Writer`], which splits a bag into several files by size and
//!   compresses whole files or single payloads
//! - the [`SequentialReader`], which replays a bag across its files with
//!   optional topic filtering
//! - pluggable [`compression`] codecs (zstd, lz4, bzip2)
//! - pluggable serialization format [`convert`]ers between the format a
//!   bag stores and the format a caller wants
//!
//! ## Architecture
//!
//! - `core/` - Errors and the record type
//! - `io/` - Storage contract, `.rec` backend, metadata, reader and writer
//! - `compression/` - Codec contract and implementations
//! - `convert/` - Converter plugins and registry
//!
//! ## Example: Recording and replaying
//!
//! ```rust,no_run
//! # fn main() -> robobag::Result<()> {
//! use robobag::{
//!     ConverterOptions, SequentialReader, SerializedRecord, StorageOptions, TopicMetadata, Writer,
//! };
//!
//! let storage = StorageOptions::new("recordings/run_1");
//! let mut writer = Writer::new();
//! writer.open(&storage, &ConverterOptions::default())?;
//! writer.create_topic(&TopicMetadata::new("/chatter", "std_msgs/msg/String", "text"))?;
//! writer.write(SerializedRecord::new("/chatter", 42, b"hello".to_vec()))?;
//! writer.close()?;
//!
//! let mut reader = SequentialReader::new();
//! reader.open(&storage, &ConverterOptions::default())?;
//! for record in reader.records() {
//!     let record = record?;
//!     println!("{} @ {}", record.topic_name, record.timestamp);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: Compressed bag
//!
//! ```rust,no_run
//! # fn main() -> robobag::Result<()> {
//! use robobag::{CompressionMode, CompressionOptions, ConverterOptions, StorageOptions, Writer};
//!
//! let mut writer = Writer::with_compression(CompressionOptions::new("zstd", CompressionMode::File))?;
//! writer.open(
//!     &StorageOptions::new("recordings/run_2").with_max_bagfile_size(256 * 1024 * 1024),
//!     &ConverterOptions::default(),
//! )?;
//! writer.close()?;
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

// Re-export core types for convenience
pub use core::{BagError, Result, SerializedRecord};

// Codecs
pub mod compression;

// Serialization format conversion
pub mod convert;

// I/O types (storage, metadata, reader, writer)
pub mod io;

// Re-export key I/O types
pub use io::filter::TopicFilter;
pub use io::metadata::{
    BagMetadata, CompressionMode, FileInformation, TopicInformation, TopicMetadata,
};
pub use io::options::{BagConfig, CompressionOptions, ConverterOptions, StorageOptions};
pub use io::reader::{ReaderBuilder, SequentialReader};
pub use io::writer::{Writer, WriterBuilder};
