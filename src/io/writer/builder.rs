// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Builder for [`Writer`](super::Writer).

use std::sync::Arc;

use crate::compression::CompressionFactory;
use crate::convert::ConverterRegistry;
use crate::io::factory::DefaultStorageFactory;
use crate::io::metadata_io::{JsonMetadataIo, MetadataIo};
use crate::io::options::CompressionOptions;
use crate::io::traits::StorageFactory;
use crate::{BagError, Result};

use super::Writer;

/// Builder wiring a writer to its collaborators.
///
/// Every collaborator has a default: the built-in storage backends, JSON
/// metadata, the default converter plugins and codecs, and no compression.
#[derive(Default)]
pub struct WriterBuilder {
    storage_factory: Option<Box<dyn StorageFactory>>,
    metadata_io: Option<Box<dyn MetadataIo>>,
    converter_registry: Option<Arc<ConverterRegistry>>,
    compression_factory: Option<CompressionFactory>,
    compression: CompressionOptions,
}

impl WriterBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom storage factory.
    pub fn storage_factory(mut self, factory: Box<dyn StorageFactory>) -> Self {
        self.storage_factory = Some(factory);
        self
    }

    /// Use a custom metadata writer.
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

    /// Set the compression options.
    pub fn compression(mut self, options: CompressionOptions) -> Self {
        self.compression = options;
        self
    }

    /// Build the writer.
    ///
    /// Fails if compression is enabled without a codec, or with a codec the
    /// factory does not know.
    pub fn build(self) -> Result<Writer> {
        self.compression.validate()?;
        let compression_factory = self.compression_factory.unwrap_or_default();
        if self.compression.is_enabled()
            && !compression_factory.supports(&self.compression.compression_format)
        {
            return Err(BagError::unsupported_codec(
                self.compression.compression_format.clone(),
            ));
        }

        Ok(Writer {
            storage_factory: self
                .storage_factory
                .unwrap_or_else(|| Box::new(DefaultStorageFactory)),
            metadata_io: self.metadata_io.unwrap_or_else(|| Box::new(JsonMetadataIo)),
            converter_registry: self.converter_registry.unwrap_or_default(),
            compression_factory,
            compression: self.compression,
            metadata: Default::default(),
            session: None,
        })
    }
}
