// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer for bags.
//!
//! This module holds the storage contract and its backends, the bag
//! metadata and its persistence, and the [`Writer`] and
//! [`SequentialReader`] built on top of them.

pub mod factory;
pub mod formats;
pub mod metadata;
pub mod metadata_io;
pub mod options;
pub mod paths;

// Re-exports
pub use factory::DefaultStorageFactory;
pub use metadata::{
    BagMetadata, CompressionMode, FileInformation, TopicInformation, TopicMetadata,
};
pub use metadata_io::{JsonMetadataIo, MetadataIo, METADATA_FILENAME};
pub use options::{BagConfig, CompressionOptions, ConverterOptions, StorageOptions};

// Storage contract
pub mod traits;
pub use traits::{Storage, StorageFactory};

// Filter for topic filtering
pub mod filter;
pub use filter::TopicFilter;

// Bag reader and writer
pub mod reader;
pub mod writer;
pub use reader::{ReaderBuilder, Records, SequentialReader};
pub use writer::{Writer, WriterBuilder};
