// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Persistence of [`BagMetadata`].
//!
//! The writer persists the metadata exactly once, after finalizing it at
//! close; the reader loads it once at open.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::metadata::BagMetadata;
use crate::{BagError, Result};

/// Name of the metadata file at the bag root.
pub const METADATA_FILENAME: &str = "metadata.json";

/// Reads and writes bag metadata.
pub trait MetadataIo: Send + Sync {
    /// Load the metadata of the bag at `uri`.
    fn read_metadata(&self, uri: &Path) -> Result<BagMetadata>;

    /// Persist metadata into the bag directory `uri`.
    fn write_metadata(&self, uri: &Path, metadata: &BagMetadata) -> Result<()>;

    /// Whether the bag at `uri` has a metadata file.
    fn metadata_file_exists(&self, uri: &Path) -> bool;
}

/// Metadata stored as pretty-printed JSON in `metadata.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMetadataIo;

impl JsonMetadataIo {
    /// Path of the metadata file of a bag.
    pub fn metadata_path(uri: &Path) -> PathBuf {
        uri.join(METADATA_FILENAME)
    }
}

impl MetadataIo for JsonMetadataIo {
    fn read_metadata(&self, uri: &Path) -> Result<BagMetadata> {
        let path = Self::metadata_path(uri);
        let text = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BagError::metadata(path.display().to_string(), "metadata file not found")
            } else {
                BagError::io(format!("reading {}", path.display()), e)
            }
        })?;
        let metadata: BagMetadata = serde_json::from_str(&text)
            .map_err(|e| BagError::metadata(path.display().to_string(), e.to_string()))?;
        if metadata.files.len() > metadata.relative_file_paths.len() {
            return Err(BagError::metadata(
                path.display().to_string(),
                format!(
                    "{} file entries for {} relative file paths",
                    metadata.files.len(),
                    metadata.relative_file_paths.len()
                ),
            ));
        }
        debug!(
            path = %path.display(),
            files = metadata.relative_file_paths.len(),
            topics = metadata.topics_with_message_count.len(),
            "Read bag metadata"
        );
        Ok(metadata)
    }

    fn write_metadata(&self, uri: &Path, metadata: &BagMetadata) -> Result<()> {
        let path = Self::metadata_path(uri);
        let text = serde_json::to_string_pretty(metadata)
            .map_err(|e| BagError::metadata(path.display().to_string(), e.to_string()))?;
        fs::write(&path, text).map_err(|e| BagError::io(format!("writing {}", path.display()), e))?;
        debug!(path = %path.display(), "Wrote bag metadata");
        Ok(())
    }

    fn metadata_file_exists(&self, uri: &Path) -> bool {
        Self::metadata_path(uri).is_file()
    }
}
