// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Serialization format conversion.
//!
//! A [`Converter`] transcodes record payloads from one serialization format
//! to another. Each format is handled by a plugin implementing
//! [`SerializationFormatConverter`]; plugins decode into a
//! [`serde_json::Value`] and encode back from it, so any pair of registered
//! formats can be converted.
//!
//! Plugins are looked up by format name in a [`ConverterRegistry`]. The
//! default registry knows:
//! - `json`: payloads are JSON documents
//! - `text`: payloads are UTF-8 strings
//!
//! # Example
//!
//! ```rust
//! # fn main() -> robobag::Result<()> {
//! use robobag::convert::{Converter, ConverterRegistry};
//! use robobag::SerializedRecord;
//!
//! let registry = ConverterRegistry::default();
//! let mut converter = Converter::new("text", "json", &registry)?;
//! converter.add_topic("/chatter", "std_msgs/msg/String");
//!
//! let record = SerializedRecord::new("/chatter", 1, b"hello".to_vec());
//! let converted = converter.convert(record)?;
//! assert_eq!(converted.payload, br#""hello""#);
//! # Ok(())
//! # }
//! ```

pub mod json;

pub use json::{JsonConverter, TextConverter};

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::{BagError, Result, SerializedRecord};

/// Plugin handling one serialization format.
pub trait SerializationFormatConverter: Send + Sync {
    /// Format name (e.g., "json").
    fn serialization_format(&self) -> &str;

    /// Decode a payload of the given message type.
    fn deserialize(&self, payload: &[u8], topic_type: &str) -> Result<serde_json::Value>;

    /// Encode a value as a payload of the given message type.
    fn serialize(&self, value: &serde_json::Value, topic_type: &str) -> Result<Vec<u8>>;
}

/// Factory for creating plugin instances.
pub trait ConverterPluginFactory: Send + Sync {
    /// Create a new plugin instance.
    fn create(&self) -> Box<dyn SerializationFormatConverter>;
}

impl<F> ConverterPluginFactory for F
where
    F: Fn() -> Box<dyn SerializationFormatConverter> + Send + Sync,
{
    fn create(&self) -> Box<dyn SerializationFormatConverter> {
        self()
    }
}

/// Registry of converter plugins by serialization format.
pub struct ConverterRegistry {
    factories: RwLock<HashMap<String, Box<dyn ConverterPluginFactory>>>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        let registry = Self::empty();
        registry.register("json", Box::new(|| -> Box<dyn SerializationFormatConverter> {
            Box::new(JsonConverter)
        }));
        registry.register("text", Box::new(|| -> Box<dyn SerializationFormatConverter> {
            Box::new(TextConverter)
        }));
        registry
    }
}

impl ConverterRegistry {
    /// Create a registry without plugins.
    pub fn empty() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Register a plugin factory for a format, replacing any previous one.
    pub fn register(&self, format: impl Into<String>, factory: Box<dyn ConverterPluginFactory>) {
        let mut factories = self.factories.write().unwrap_or_else(|e| e.into_inner());
        factories.insert(format.into(), factory);
    }

    /// Unregister a format. Returns `true` if it was registered.
    pub fn unregister(&self, format: &str) -> bool {
        let mut factories = self.factories.write().unwrap_or_else(|e| e.into_inner());
        factories.remove(format).is_some()
    }

    /// Check if a format is registered.
    pub fn has_format(&self, format: &str) -> bool {
        let factories = self.factories.read().unwrap_or_else(|e| e.into_inner());
        factories.contains_key(format)
    }

    /// Registered formats, sorted.
    pub fn formats(&self) -> Vec<String> {
        let factories = self.factories.read().unwrap_or_else(|e| e.into_inner());
        let mut formats: Vec<String> = factories.keys().cloned().collect();
        formats.sort();
        formats
    }

    /// Create the plugin for a format.
    pub fn create_plugin(&self, format: &str) -> Result<Box<dyn SerializationFormatConverter>> {
        let factories = self.factories.read().unwrap_or_else(|e| e.into_inner());
        factories
            .get(format)
            .map(|factory| factory.create())
            .ok_or_else(|| BagError::ConverterUnavailable {
                format: format.to_string(),
            })
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("formats", &self.formats())
            .finish()
    }
}

/// Transcodes record payloads between two serialization formats.
pub struct Converter {
    input: Box<dyn SerializationFormatConverter>,
    output: Box<dyn SerializationFormatConverter>,
    /// Message type per topic name
    topic_types: HashMap<String, String>,
}

impl Converter {
    /// Create a converter, failing with
    /// [`BagError::ConverterUnavailable`] if either format is unknown.
    pub fn new(input_format: &str, output_format: &str, registry: &ConverterRegistry) -> Result<Self> {
        let input = registry.create_plugin(input_format)?;
        let output = registry.create_plugin(output_format)?;
        debug!(input = input_format, output = output_format, "Created converter");
        Ok(Self {
            input,
            output,
            topic_types: HashMap::new(),
        })
    }

    /// Format records are converted from.
    pub fn input_format(&self) -> &str {
        self.input.serialization_format()
    }

    /// Format records are converted to.
    pub fn output_format(&self) -> &str {
        self.output.serialization_format()
    }

    /// Make a topic's message type known.
    pub fn add_topic(&mut self, name: impl Into<String>, topic_type: impl Into<String>) {
        self.topic_types.insert(name.into(), topic_type.into());
    }

    /// Convert a record's payload; the timestamp and topic are kept.
    pub fn convert(&self, mut record: SerializedRecord) -> Result<SerializedRecord> {
        let topic_type = self.topic_types.get(&record.topic_name).ok_or_else(|| {
            BagError::conversion(&record.topic_name, "topic is not registered with the converter")
        })?;
        let on_topic = |e: BagError| match e {
            BagError::Conversion { message, .. } => BagError::conversion(&record.topic_name, message),
            other => other,
        };
        let value = self
            .input
            .deserialize(&record.payload, topic_type)
            .map_err(on_topic)?;
        let payload = self.output.serialize(&value, topic_type).map_err(on_topic)?;
        record.replace_payload(payload);
        Ok(record)
    }
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("input", &self.input_format())
            .field("output", &self.output_format())
            .field("topics", &self.topic_types.len())
            .finish()
    }
}
