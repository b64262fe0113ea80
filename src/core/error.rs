// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for robobag.
//!
//! Every fallible operation in the crate returns [`Result`], whose error
//! side is one [`BagError`] variant:
//! - Precondition violations (not open, topic registry misuse, mixed formats)
//! - Storage backend and filesystem failures
//! - Codec failures from compression or decompression
//! - Serialization format conversion failures

use thiserror::Error;

/// Errors that can occur while writing or reading a bag.
#[derive(Debug, Error)]
pub enum BagError {
    /// Operation invoked before a successful `open()`
    #[error("Bag is not open. Call open() before {operation}")]
    NotOpen {
        /// Operation that was attempted
        operation: &'static str,
    },

    /// `open()` called on an instance that is already open
    #[error("Bag is already open at '{uri}'")]
    AlreadyOpen {
        /// URI of the currently open bag
        uri: String,
    },

    /// Storage backend could not be created for a file
    #[error("No storage could be initialized for '{uri}' (storage id '{storage_id}')")]
    StorageOpen {
        /// Storage URI that failed to open
        uri: String,
        /// Requested storage backend identifier
        storage_id: String,
    },

    /// Topics of one bag disagree on their serialization format
    #[error(
        "Topics with different serialization formats found: topic '{topic}' uses '{found}', expected '{expected}'"
    )]
    FormatMismatch {
        /// Offending topic
        topic: String,
        /// Serialization format of the first topic
        expected: String,
        /// Serialization format of the offending topic
        found: String,
    },

    /// Topic registered twice with different metadata
    #[error("Topic '{name}' is already registered with different metadata")]
    DuplicateTopic {
        /// Topic name
        name: String,
    },

    /// Topic was never registered
    #[error("Unknown topic '{name}'")]
    UnknownTopic {
        /// Topic name
        name: String,
    },

    /// Filesystem or storage I/O failure
    #[error("I/O error ({context}): {source}")]
    Io {
        /// What was being done, usually including the path
        context: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Compression or decompression failure
    #[error("{codec} codec error: {message}")]
    Codec {
        /// Codec identifier
        codec: String,
        /// Error message
        message: String,
    },

    /// Read past the end of the record stream
    #[error("No more records to read")]
    Exhausted,

    /// Bag metadata could not be read, decoded or written
    #[error("Invalid bag metadata at '{path}': {message}")]
    Metadata {
        /// Metadata file path
        path: String,
        /// Error message
        message: String,
    },

    /// No converter plugin is registered for a serialization format
    #[error("No converter plugin available for serialization format '{format}'")]
    ConverterUnavailable {
        /// Requested serialization format
        format: String,
    },

    /// A converter plugin failed to transcode a record
    #[error("Failed to convert record on topic '{topic}': {message}")]
    Conversion {
        /// Topic of the record
        topic: String,
        /// Error message
        message: String,
    },

    /// Invalid combination of options
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

impl BagError {
    /// Create a "not open" error for the named operation.
    pub fn not_open(operation: &'static str) -> Self {
        BagError::NotOpen { operation }
    }

    /// Create a storage open error.
    pub fn storage_open(uri: impl Into<String>, storage_id: impl Into<String>) -> Self {
        BagError::StorageOpen {
            uri: uri.into(),
            storage_id: storage_id.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        BagError::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a codec error.
    pub fn codec(codec: impl Into<String>, message: impl Into<String>) -> Self {
        BagError::Codec {
            codec: codec.into(),
            message: message.into(),
        }
    }

    /// Create an "unsupported compression format" error.
    pub fn unsupported_codec(format: impl Into<String>) -> Self {
        let format = format.into();
        BagError::Codec {
            message: format!("unsupported compression format '{format}'"),
            codec: format,
        }
    }

    /// Create an unknown topic error.
    pub fn unknown_topic(name: impl Into<String>) -> Self {
        BagError::UnknownTopic { name: name.into() }
    }

    /// Create a duplicate topic error.
    pub fn duplicate_topic(name: impl Into<String>) -> Self {
        BagError::DuplicateTopic { name: name.into() }
    }

    /// Create a metadata error.
    pub fn metadata(path: impl Into<String>, message: impl Into<String>) -> Self {
        BagError::Metadata {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a conversion error.
    pub fn conversion(topic: impl Into<String>, message: impl Into<String>) -> Self {
        BagError::Conversion {
            topic: topic.into(),
            message: message.into(),
        }
    }

    /// Whether this error reports a caller or data precondition violation.
    ///
    /// These are never worth retrying.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            BagError::NotOpen { .. }
                | BagError::AlreadyOpen { .. }
                | BagError::FormatMismatch { .. }
                | BagError::DuplicateTopic { .. }
                | BagError::UnknownTopic { .. }
                | BagError::Exhausted
                | BagError::InvalidOptions(_)
        )
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            BagError::NotOpen { operation } => vec![("operation", operation.to_string())],
            BagError::AlreadyOpen { uri } => vec![("uri", uri.clone())],
            BagError::StorageOpen { uri, storage_id } => {
                vec![("uri", uri.clone()), ("storage_id", storage_id.clone())]
            }
            BagError::FormatMismatch {
                topic,
                expected,
                found,
            } => vec![
                ("topic", topic.clone()),
                ("expected", expected.clone()),
                ("found", found.clone()),
            ],
            BagError::DuplicateTopic { name } | BagError::UnknownTopic { name } => {
                vec![("topic", name.clone())]
            }
            BagError::Io { context, source } => {
                vec![("context", context.clone()), ("source", source.to_string())]
            }
            BagError::Codec { codec, message } => {
                vec![("codec", codec.clone()), ("message", message.clone())]
            }
            BagError::Exhausted => Vec::new(),
            BagError::Metadata { path, message } => {
                vec![("path", path.clone()), ("message", message.clone())]
            }
            BagError::ConverterUnavailable { format } => vec![("format", format.clone())],
            BagError::Conversion { topic, message } => {
                vec![("topic", topic.clone()), ("message", message.clone())]
            }
            BagError::InvalidOptions(msg) => vec![("message", msg.clone())],
        }
    }
}

impl From<std::io::Error> for BagError {
    fn from(err: std::io::Error) -> Self {
        BagError::Io {
            context: "io".to_string(),
            source: err,
        }
    }
}

/// Result type for robobag operations.
pub type Result<T> = std::result::Result<T, BagError>;
