// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Storage factory for the backends shipped with robobag.

use std::path::Path;

use tracing::warn;

use super::formats::rec::{self, RecReader, RecWriter};
use super::traits::{Storage, StorageFactory};

/// Storage factory knowing the built-in backends.
///
/// An empty storage identifier selects the REC backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStorageFactory;

impl DefaultStorageFactory {
    /// Whether a storage identifier names a built-in backend.
    pub fn supports(storage_id: &str) -> bool {
        storage_id.is_empty() || storage_id == rec::STORAGE_ID
    }
}

impl StorageFactory for DefaultStorageFactory {
    fn open_read_only(&self, uri: &Path, storage_id: &str) -> Option<Box<dyn Storage>> {
        if !Self::supports(storage_id) {
            warn!(storage_id, "Unknown storage backend");
            return None;
        }
        match RecReader::open(uri) {
            Ok(reader) => Some(Box::new(reader)),
            Err(e) => {
                warn!(uri = %uri.display(), error = %e, "Failed to open storage for reading");
                None
            }
        }
    }

    fn open_read_write(&self, uri: &Path, storage_id: &str) -> Option<Box<dyn Storage>> {
        if !Self::supports(storage_id) {
            warn!(storage_id, "Unknown storage backend");
            return None;
        }
        match RecWriter::create(uri) {
            Ok(writer) => Some(Box::new(writer)),
            Err(e) => {
                warn!(uri = %uri.display(), error = %e, "Failed to open storage for writing");
                None
            }
        }
    }
}
