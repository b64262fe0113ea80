// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Builder for [`SequentialReader`](super::SequentialReader).

use std::sync::Arc;

use crate::compression::CompressionFactory;
use crate::convert::ConverterRegistry;
use crate::io::factory::DefaultStorageFactory;
use crate::io::filter::TopicFilter;
use crate::io::metadata::BagMetadata;
use crate::io::metadata_io::{JsonMetadataIo, MetadataIo};
use crate::io::traits::StorageFactory;

use super::SequentialReader;

/// Builder wiring a reader to its collaborators.
///
/// # Example
///
/// ```rust,no_run
/// # fn main() -> robobag::Result<()> {
/// use robobag::io::filter::TopicFilter;
/// use robobag::{ConverterOptions, SequentialReader, StorageOptions};
///
/// let mut reader = SequentialReader::builder()
///     .filter(TopicFilter::include(["/odom"]))
///     .build();
/// reader.open(&StorageOptions::new("recordings/run_1"), &ConverterOptions::default())?;
/// while reader.has_next()? {
///     let record = reader.read_next()?;
///     println!("{} @ {}", record.topic_name, record.timestamp);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ReaderBuilder {
    storage_factory: Option<Box<dyn StorageFactory>>,
    metadata_io: Option<Box<dyn MetadataIo>>,
    converter_registry: Option<Arc<ConverterRegistry>>,
    compression_factory: Option<CompressionFactory>,
    filter: TopicFilter,
}

impl ReaderBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom storage factory.
    pub fn storage_factory(mut self, factory: Box<dyn StorageFactory>) -> Self {
        self.storage_factory = Some(factory);
        self
    }

    /// Use a custom metadata reader.
    pub fn metadata_io(mut self, metadata_io: Box<dyn MetadataIo>) -> Self {
        self.metadata_io = Some(metadata_io);
        self
    }

    /// Use a custom converter registry.
    pub fn converter_registry(mut self, registry: Arc<ConverterRegistry>) -> Self {
        self.converter_registry = Some(registry);
        self
    }

    /// Use a custom codec factory.
    pub fn compression_factory(mut self, factory: CompressionFactory) -> Self {
        self.compression_factory = Some(factory);
        self
    }

    /// Set the initial topic filter.
    pub fn filter(mut self, filter: TopicFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Build the reader.
    pub fn build(self) -> SequentialReader {
        SequentialReader {
            storage_factory: self
                .storage_factory
                .unwrap_or_else(|| Box::new(DefaultStorageFactory)),
            metadata_io: self.metadata_io.unwrap_or_else(|| Box::new(JsonMetadataIo)),
            converter_registry: self.converter_registry.unwrap_or_default(),
            compression_factory: self.compression_factory.unwrap_or_default(),
            filter: self.filter,
            metadata: BagMetadata::default(),
            session: None,
        }
    }
}
