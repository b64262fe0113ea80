// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Options for opening bags, and their TOML configuration file.
//!
//! ```toml
//! [storage]
//! uri = "recordings/run_42"
//! storage_id = "rec"
//! max_bagfile_size = 104857600
//!
//! [converter]
//! input_serialization_format = "json"
//! output_serialization_format = "json"
//!
//! [compression]
//! compression_format = "zstd"
//! mode = "file"
//! level = 9
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::metadata::CompressionMode;
use crate::{BagError, Result};

/// `max_bagfile_size` value that disables splitting.
pub const MAX_BAGFILE_SIZE_NO_SPLIT: u64 = 0;

/// Default storage backend identifier.
pub const DEFAULT_STORAGE_ID: &str = "rec";

/// Where and how the bag's files are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    /// Bag directory
    pub uri: PathBuf,
    /// Storage backend identifier
    pub storage_id: String,
    /// Size in bytes above which the writer rolls over to a new file
    /// (0 = never split)
    pub max_bagfile_size: u64,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            uri: PathBuf::new(),
            storage_id: DEFAULT_STORAGE_ID.to_string(),
            max_bagfile_size: MAX_BAGFILE_SIZE_NO_SPLIT,
        }
    }
}

impl StorageOptions {
    /// Create options for the bag at `uri` with default settings.
    pub fn new(uri: impl AsRef<Path>) -> Self {
        Self {
            uri: uri.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Set the storage backend identifier.
    pub fn with_storage_id(mut self, storage_id: impl Into<String>) -> Self {
        self.storage_id = storage_id.into();
        self
    }

    /// Set the split threshold in bytes.
    pub fn with_max_bagfile_size(mut self, size: u64) -> Self {
        self.max_bagfile_size = size;
        self
    }

    /// Whether the writer rolls over to new files.
    pub fn splits(&self) -> bool {
        self.max_bagfile_size != MAX_BAGFILE_SIZE_NO_SPLIT
    }
}

/// Serialization formats on either side of the converter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterOptions {
    /// Format of the records handed to the writer / stored in the bag
    pub input_serialization_format: String,
    /// Format of the records stored by the writer / returned by the reader
    pub output_serialization_format: String,
}

impl ConverterOptions {
    /// Create converter options.
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input_serialization_format: input.into(),
            output_serialization_format: output.into(),
        }
    }

    /// Options that leave records in `format`.
    pub fn passthrough(format: impl Into<String>) -> Self {
        let format = format.into();
        Self::new(format.clone(), format)
    }

    /// Whether records need transcoding.
    pub fn needs_conversion(&self) -> bool {
        self.input_serialization_format != self.output_serialization_format
    }
}

/// Compression codec and granularity of a bag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionOptions {
    /// Codec identifier (e.g., "zstd"); empty disables compression
    pub compression_format: String,
    /// Compression granularity
    pub mode: CompressionMode,
    /// Codec-specific level for file compression
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<i32>,
}

impl CompressionOptions {
    /// Create compression options.
    pub fn new(compression_format: impl Into<String>, mode: CompressionMode) -> Self {
        Self {
            compression_format: compression_format.into(),
            mode,
            level: None,
        }
    }

    /// Set the file compression level.
    pub fn with_level(mut self, level: i32) -> Self {
        self.level = Some(level);
        self
    }

    /// Whether any compression applies.
    pub fn is_enabled(&self) -> bool {
        self.mode != CompressionMode::None
    }

    /// Check that a compressing mode names a codec.
    pub fn validate(&self) -> Result<()> {
        if self.is_enabled() && self.compression_format.is_empty() {
            return Err(BagError::InvalidOptions(format!(
                "compression mode '{}' requires a compression format",
                self.mode
            )));
        }
        Ok(())
    }
}

/// Complete bag configuration as loaded from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BagConfig {
    /// Storage options
    pub storage: StorageOptions,
    /// Converter options
    pub converter: ConverterOptions,
    /// Compression options
    pub compression: CompressionOptions,
}

impl BagConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: BagConfig =
            toml::from_str(text).map_err(|e| BagError::InvalidOptions(e.to_string()))?;
        config.compression.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| BagError::io(format!("reading config {}", path.display()), e))?;
        Self::from_toml_str(&text)
    }

    /// Render the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| BagError::InvalidOptions(e.to_string()))
    }
}
