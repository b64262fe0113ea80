// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Bag writer.
//!
//! The [`Writer`] appends records to the active storage file of a bag and
//! rolls over to a new file once the active one grows past the configured
//! size. Each record passes through:
//!
//! 1. the converter, if the input and output formats differ
//! 2. the compressor, in message mode
//! 3. the storage backend
//!
//! In file mode every closed file, the last one included, is compressed as
//! a whole and replaced by its compressed version. The bag metadata is
//! built incrementally and persisted once, when the writer closes.
//!
//! # Example
//!
//! ```rust,no_run
//! # fn main() -> robobag::Result<()> {
//! use robobag::{ConverterOptions, SerializedRecord, StorageOptions, TopicMetadata, Writer};
//!
//! let mut writer = Writer::new();
//! writer.open(
//!     &StorageOptions::new("recordings/run_1").with_max_bagfile_size(64 * 1024 * 1024),
//!     &ConverterOptions::passthrough("json"),
//! )?;
//! writer.create_topic(&TopicMetadata::new("/odom", "nav_msgs/msg/Odometry", "json"))?;
//! writer.write(SerializedRecord::new("/odom", 1_700_000_000_000_000_000, br#"{"x":1}"#.to_vec()))?;
//! writer.close()?;
//! # Ok(())
//! # }
//! ```

pub mod builder;

pub use builder::WriterBuilder;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::compression::{CompressionFactory, Compressor};
use crate::convert::{Converter, ConverterRegistry};
use crate::io::metadata::{
    BagMetadata, CompressionMode, FileInformation, TopicInformation, TopicMetadata,
};
use crate::io::metadata_io::MetadataIo;
use crate::io::options::{CompressionOptions, ConverterOptions, StorageOptions};
use crate::io::paths;
use crate::io::traits::{Storage, StorageFactory};
use crate::{BagError, Result, SerializedRecord};

/// State of an open writer.
struct Session {
    /// Active storage file
    storage: Box<dyn Storage>,
    /// Bag directory
    base_folder: PathBuf,
    /// Storage backend identifier requested at open
    storage_id: String,
    /// Split threshold in bytes (0 = never)
    max_bagfile_size: u64,
    /// Registered topics in creation order
    topics: Vec<TopicInformation>,
    /// Payload transcoding, when input and output formats differ
    converter: Option<Converter>,
    /// Codec, when compression is enabled
    compressor: Option<Box<dyn Compressor>>,
    /// Compression granularity
    mode: CompressionMode,
    /// Latest timestamp written
    latest_timestamp: u64,
    /// Active file was already compressed by a split that failed later on
    active_compressed: bool,
}

impl Session {
    fn topic_index(&self, name: &str) -> Option<usize> {
        self.topics
            .iter()
            .position(|t| t.topic_metadata.name == name)
    }

    fn should_split(&self) -> bool {
        self.max_bagfile_size > 0 && self.storage.get_bagfile_size() > self.max_bagfile_size
    }

    /// Open the storage file with the given index.
    fn open_storage(
        &self,
        factory: &dyn StorageFactory,
        index: usize,
    ) -> Result<Box<dyn Storage>> {
        let uri = paths::storage_uri(&self.base_folder, index);
        factory
            .open_read_write(&uri, &self.storage_id)
            .ok_or_else(|| BagError::storage_open(uri.display().to_string(), &self.storage_id))
    }
}

/// Writes records into a bag, splitting and compressing files as configured.
///
/// A writer can be reused: after [`close`](Writer::close) it may be opened
/// again on another bag. Dropping an open writer closes it and logs any
/// error.
pub struct Writer {
    storage_factory: Box<dyn StorageFactory>,
    metadata_io: Box<dyn MetadataIo>,
    converter_registry: Arc<ConverterRegistry>,
    compression_factory: CompressionFactory,
    compression: CompressionOptions,
    /// Metadata of the current bag, or of the last closed one
    metadata: BagMetadata,
    session: Option<Session>,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// Create an uncompressed writer with the default collaborators.
    pub fn new() -> Self {
        Self {
            storage_factory: Box::new(crate::io::factory::DefaultStorageFactory),
            metadata_io: Box::new(crate::io::metadata_io::JsonMetadataIo),
            converter_registry: Arc::default(),
            compression_factory: CompressionFactory::default(),
            compression: CompressionOptions::default(),
            metadata: BagMetadata::default(),
            session: None,
        }
    }

    /// Create a writer applying the given compression.
    pub fn with_compression(options: CompressionOptions) -> Result<Self> {
        WriterBuilder::new().compression(options).build()
    }

    /// Create a builder for a writer with custom collaborators.
    pub fn builder() -> WriterBuilder {
        WriterBuilder::new()
    }

    /// Open a bag for writing.
    ///
    /// Creates the bag directory and its first file.
    pub fn open(
        &mut self,
        storage_options: &StorageOptions,
        converter_options: &ConverterOptions,
    ) -> Result<()> {
        if self.session.is_some() {
            return Err(BagError::AlreadyOpen {
                uri: self.base_folder_display(),
            });
        }

        let base_folder = storage_options.uri.clone();
        std::fs::create_dir_all(&base_folder).map_err(|e| {
            BagError::io(format!("creating bag directory {}", base_folder.display()), e)
        })?;

        let converter = if converter_options.needs_conversion() {
            Some(Converter::new(
                &converter_options.input_serialization_format,
                &converter_options.output_serialization_format,
                &self.converter_registry,
            )?)
        } else {
            None
        };

        let (compressor, mode) = if self.compression.is_enabled() {
            let compressor = self
                .compression_factory
                .create_compressor(&self.compression.compression_format, self.compression.level)?;
            (Some(compressor), self.compression.mode)
        } else {
            (None, CompressionMode::None)
        };

        let uri = paths::storage_uri(&base_folder, 0);
        let storage = self
            .storage_factory
            .open_read_write(&uri, &storage_options.storage_id)
            .ok_or_else(|| {
                BagError::storage_open(uri.display().to_string(), &storage_options.storage_id)
            })?;

        let mut metadata = BagMetadata::for_recording(storage.get_storage_identifier());
        let relative = paths::relative_to(&base_folder, storage.get_relative_path());
        metadata.relative_file_paths.push(relative.clone());
        metadata.files.push(FileInformation::new(relative));
        if let Some(compressor) = &compressor {
            metadata.compression_format = compressor.identifier().to_string();
            metadata.compression_mode = mode;
        }

        info!(
            uri = %base_folder.display(),
            storage_id = %metadata.storage_identifier,
            max_bagfile_size = storage_options.max_bagfile_size,
            compression_format = %metadata.compression_format,
            compression_mode = %mode,
            "Opened bag for writing"
        );

        self.metadata = metadata;
        self.session = Some(Session {
            storage,
            base_folder,
            storage_id: storage_options.storage_id.clone(),
            max_bagfile_size: storage_options.max_bagfile_size,
            topics: Vec::new(),
            converter,
            compressor,
            mode,
            latest_timestamp: 0,
            active_compressed: false,
        });
        Ok(())
    }

    /// Register a topic.
    ///
    /// Registering identical metadata again is a no-op. When records are
    /// converted, the topic is stored with the output serialization format.
    pub fn create_topic(&mut self, topic: &TopicMetadata) -> Result<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| BagError::not_open("creating a topic"))?;

        let mut stored = topic.clone();
        if let Some(converter) = &session.converter {
            stored.serialization_format = converter.output_format().to_string();
        }

        if let Some(index) = session.topic_index(&topic.name) {
            if session.topics[index].topic_metadata == stored {
                return Ok(());
            }
            return Err(BagError::duplicate_topic(&topic.name));
        }

        if let Some(first) = session.topics.first() {
            if first.topic_metadata.serialization_format != stored.serialization_format {
                warn!(
                    topic = %stored.name,
                    format = %stored.serialization_format,
                    expected = %first.topic_metadata.serialization_format,
                    "Topic serialization format differs from the rest of the bag; readers will reject it"
                );
            }
        }

        session.storage.create_topic(&stored)?;
        if let Some(converter) = session.converter.as_mut() {
            converter.add_topic(&topic.name, &topic.topic_type);
        }
        debug!(topic = %stored.name, topic_type = %stored.topic_type, "Created topic");
        session.topics.push(TopicInformation::new(stored));
        Ok(())
    }

    /// Unregister a topic.
    pub fn remove_topic(&mut self, topic: &TopicMetadata) -> Result<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| BagError::not_open("removing a topic"))?;
        let index = session
            .topic_index(&topic.name)
            .ok_or_else(|| BagError::unknown_topic(&topic.name))?;

        session
            .storage
            .remove_topic(&session.topics[index].topic_metadata)?;
        session.topics.remove(index);
        debug!(topic = %topic.name, "Removed topic");
        Ok(())
    }

    /// Write a record.
    ///
    /// If the active file has grown past the size threshold, the writer
    /// splits before storing, so the record lands in the new file.
    ///
    /// Counters and timestamps are only updated once the record is stored;
    /// a failed write leaves the metadata untouched.
    pub fn write(&mut self, record: SerializedRecord) -> Result<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| BagError::not_open("writing"))?;
        let index = session
            .topic_index(&record.topic_name)
            .ok_or_else(|| BagError::unknown_topic(&record.topic_name))?;

        if session.should_split() {
            self.split_bagfile()?;
        }
        let Some(session) = self.session.as_mut() else {
            return Err(BagError::not_open("writing"));
        };

        let timestamp = record.timestamp;
        let record = match &session.converter {
            Some(converter) => converter.convert(record)?,
            None => record,
        };
        let record = match (&session.compressor, session.mode) {
            (Some(compressor), CompressionMode::Message) => compressor.compress_record(record),
            _ => record,
        };
        session.storage.write(record)?;

        session.topics[index].message_count += 1;
        self.metadata.starting_time = self.metadata.starting_time.min(timestamp);
        session.latest_timestamp = session.latest_timestamp.max(timestamp);
        self.metadata.duration = session.latest_timestamp - self.metadata.starting_time;
        self.metadata.message_count += 1;
        if let Some(file) = self.metadata.files.last_mut() {
            file.record(timestamp);
        }
        Ok(())
    }

    /// Close the active file and continue in a new one.
    ///
    /// In file mode the closed file is compressed and its entry in the
    /// metadata replaced by the compressed path before the new file is
    /// opened. If any step fails the closed file stays active, and the
    /// next write retries the split.
    pub fn split_bagfile(&mut self) -> Result<()> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| BagError::not_open("splitting"))?;

        session.storage.close()?;
        let closed_path = session.storage.get_relative_path().to_path_buf();
        let closed_index = self.metadata.relative_file_paths.len().saturating_sub(1);
        let closed_size = session.storage.get_bagfile_size();

        if let (Some(compressor), CompressionMode::File) = (&session.compressor, session.mode) {
            if !session.active_compressed {
                let compressed = compress_closed_file(compressor.as_ref(), &closed_path)?;
                substitute_path(
                    &mut self.metadata,
                    closed_index,
                    paths::relative_to(&session.base_folder, &compressed),
                );
                session.active_compressed = true;
            }
        }

        let new_index = self.metadata.relative_file_paths.len();
        let mut storage = session.open_storage(self.storage_factory.as_ref(), new_index)?;
        for topic in &session.topics {
            storage.create_topic(&topic.topic_metadata)?;
        }
        session.storage = storage;
        session.active_compressed = false;

        let relative = paths::relative_to(&session.base_folder, session.storage.get_relative_path());
        self.metadata.relative_file_paths.push(relative.clone());
        self.metadata.files.push(FileInformation::new(relative));

        info!(
            closed = %closed_path.display(),
            closed_size,
            index = new_index,
            "Split bag file"
        );
        Ok(())
    }

    /// Close the bag: close the active file, compress it in file mode,
    /// finalize the metadata and persist it.
    ///
    /// Closing a writer that is not open does nothing.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        session.storage.close()?;
        if let (Some(compressor), CompressionMode::File, false) =
            (&session.compressor, session.mode, session.active_compressed)
        {
            let last_path = session.storage.get_relative_path().to_path_buf();
            let compressed = compress_closed_file(compressor.as_ref(), &last_path)?;
            let last_index = self.metadata.relative_file_paths.len().saturating_sub(1);
            substitute_path(
                &mut self.metadata,
                last_index,
                paths::relative_to(&session.base_folder, &compressed),
            );
        }

        self.finalize_metadata(&session)?;
        self.metadata_io
            .write_metadata(&session.base_folder, &self.metadata)?;

        info!(
            uri = %session.base_folder.display(),
            files = self.metadata.relative_file_paths.len(),
            messages = self.metadata.message_count,
            bag_size = self.metadata.bag_size,
            "Closed bag"
        );
        Ok(())
    }

    fn finalize_metadata(&mut self, session: &Session) -> Result<()> {
        let mut bag_size = 0;
        for relative in &self.metadata.relative_file_paths {
            let path = paths::resolve(&session.base_folder, relative);
            bag_size += std::fs::metadata(&path)
                .map_err(|e| BagError::io(format!("reading size of {}", path.display()), e))?
                .len();
        }
        self.metadata.bag_size = bag_size;
        self.metadata.topics_with_message_count = session.topics.clone();
        self.metadata.message_count = session.topics.iter().map(|t| t.message_count).sum();

        if self.metadata.starting_time == u64::MAX {
            self.metadata.starting_time = 0;
        }
        for file in &mut self.metadata.files {
            if file.message_count == 0 {
                file.starting_time = 0;
            }
        }
        Ok(())
    }

    /// Metadata of the current bag, or of the last closed one.
    ///
    /// While the writer is open, file sizes and topic counts are only
    /// complete after [`close`](Writer::close).
    pub fn metadata(&self) -> &BagMetadata {
        &self.metadata
    }

    /// Whether the writer is open.
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Topics registered in the open bag.
    pub fn topics(&self) -> &[TopicInformation] {
        self.session
            .as_ref()
            .map(|s| s.topics.as_slice())
            .unwrap_or(&[])
    }

    /// Directory of the open bag.
    pub fn base_folder(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.base_folder.as_path())
    }

    /// Compression options the writer was built with.
    pub fn compression_options(&self) -> &CompressionOptions {
        &self.compression
    }

    fn base_folder_display(&self) -> String {
        self.base_folder()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }
}

impl Drop for Writer {
    fn drop(&mut self) {
        if self.session.is_some() {
            if let Err(e) = self.close() {
                warn!(error = %e, fields = ?e.log_fields(), "Failed to close bag writer");
            }
        }
    }
}

/// Compress a closed file and remove the uncompressed original.
fn compress_closed_file(compressor: &dyn Compressor, path: &Path) -> Result<PathBuf> {
    let compressed = compressor.compress_file(path)?;
    std::fs::remove_file(path)
        .map_err(|e| BagError::io(format!("removing {}", path.display()), e))?;
    Ok(compressed)
}

/// Replace the path of file `index` in the metadata.
fn substitute_path(metadata: &mut BagMetadata, index: usize, relative: String) {
    if let Some(file) = metadata.files.get_mut(index) {
        file.path = relative.clone();
    }
    if let Some(entry) = metadata.relative_file_paths.get_mut(index) {
        *entry = relative;
    }
}
