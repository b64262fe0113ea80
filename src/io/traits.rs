// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Storage backend traits.
//!
//! A [`Storage`] persists and retrieves records for exactly one physical
//! file of a bag. The writer and the reader never open files themselves;
//! they ask a [`StorageFactory`] for a backend by URI and identifier, which
//! lets tests and embedders plug in their own storage.

use std::path::Path;

use super::metadata::{BagMetadata, TopicMetadata};
use crate::{Result, SerializedRecord};

/// One physical bag file opened by a storage backend.
///
/// Backends are driven from a single thread but may be moved between
/// threads along with their owner.
pub trait Storage: Send {
    /// Whether an unread record remains.
    fn has_next(&mut self) -> Result<bool>;

    /// Read the next record in file order.
    fn read_next(&mut self) -> Result<SerializedRecord>;

    /// Append a record. Its topic must have been created.
    fn write(&mut self, record: SerializedRecord) -> Result<()>;

    /// Register a topic in this file.
    fn create_topic(&mut self, topic: &TopicMetadata) -> Result<()>;

    /// Unregister a topic from this file.
    fn remove_topic(&mut self, topic: &TopicMetadata) -> Result<()>;

    /// Topics present in this file.
    fn get_all_topics_and_types(&self) -> Vec<TopicMetadata>;

    /// Path of the file including the backend's extension.
    fn get_relative_path(&self) -> &Path;

    /// Statistics of this single file as bag metadata.
    fn get_metadata(&self) -> BagMetadata;

    /// Current size of the file in bytes, including buffered writes.
    fn get_bagfile_size(&self) -> u64;

    /// Identifier of the backend, persisted in the bag metadata.
    fn get_storage_identifier(&self) -> &str;

    /// Flush and release the file.
    ///
    /// Calling `close` twice is harmless.
    fn close(&mut self) -> Result<()>;
}

/// Opens storage backends by URI and identifier.
///
/// `uri` is a file path without the backend extension. `None` means no
/// backend could be opened; callers turn it into
/// [`BagError::StorageOpen`](crate::BagError::StorageOpen).
pub trait StorageFactory: Send + Sync {
    /// Open an existing file for reading.
    fn open_read_only(&self, uri: &Path, storage_id: &str) -> Option<Box<dyn Storage>>;

    /// Create a file for writing, truncating any previous content.
    fn open_read_write(&self, uri: &Path, storage_id: &str) -> Option<Box<dyn Storage>>;
}
