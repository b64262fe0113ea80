// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Bag metadata types.
//!
//! [`BagMetadata`] is the manifest of one logical bag: the ordered list of
//! physical files, per-topic message counts, compression settings and time
//! bounds. The writer builds it incrementally and persists it at close; the
//! reader loads it once at open.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{BagError, Result};

/// Current metadata layout version.
pub const METADATA_VERSION: u32 = 1;

/// Description of a topic: a named, typed channel of records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMetadata {
    /// Topic name (e.g., "/joint_states")
    pub name: String,
    /// Message schema identifier (e.g., "sensor_msgs/msg/JointState")
    #[serde(rename = "type")]
    pub topic_type: String,
    /// Serialization format of the payloads (e.g., "cdr", "json")
    pub serialization_format: String,
    /// Opaque QoS description recorded alongside the topic
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub offered_qos_profiles: String,
}

impl TopicMetadata {
    /// Create a new TopicMetadata.
    pub fn new(
        name: impl Into<String>,
        topic_type: impl Into<String>,
        serialization_format: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            topic_type: topic_type.into(),
            serialization_format: serialization_format.into(),
            offered_qos_profiles: String::new(),
        }
    }

    /// Set the QoS profile description.
    pub fn with_qos_profiles(mut self, profiles: impl Into<String>) -> Self {
        self.offered_qos_profiles = profiles.into();
        self
    }
}

/// A topic together with the number of records written to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicInformation {
    /// Topic description
    pub topic_metadata: TopicMetadata,
    /// Number of records on this topic
    pub message_count: u64,
}

impl TopicInformation {
    /// Create a zero-count entry for a topic.
    pub fn new(topic_metadata: TopicMetadata) -> Self {
        Self {
            topic_metadata,
            message_count: 0,
        }
    }
}

/// Statistics for one physical file of a bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInformation {
    /// Path relative to the bag directory
    pub path: String,
    /// Earliest timestamp in the file (nanoseconds)
    pub starting_time: u64,
    /// Latest timestamp minus earliest timestamp (nanoseconds)
    pub duration: u64,
    /// Number of records in the file
    pub message_count: u64,
}

impl FileInformation {
    /// Create an empty entry for a file.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            starting_time: u64::MAX,
            duration: 0,
            message_count: 0,
        }
    }

    /// Account for one record with the given timestamp.
    pub fn record(&mut self, timestamp: u64) {
        let end = self.end_time().max(timestamp);
        self.starting_time = self.starting_time.min(timestamp);
        self.duration = end - self.starting_time;
        self.message_count += 1;
    }

    fn end_time(&self) -> u64 {
        if self.message_count == 0 {
            0
        } else {
            self.starting_time + self.duration
        }
    }
}

/// Granularity at which compression is applied to a bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMode {
    /// No compression
    #[default]
    None,
    /// Each closed storage file is compressed as a whole
    File,
    /// Each record payload is compressed individually
    Message,
}

impl CompressionMode {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionMode::None => "none",
            CompressionMode::File => "file",
            CompressionMode::Message => "message",
        }
    }
}

impl fmt::Display for CompressionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionMode {
    type Err = BagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "" | "none" => Ok(CompressionMode::None),
            "file" => Ok(CompressionMode::File),
            "message" => Ok(CompressionMode::Message),
            other => Err(BagError::InvalidOptions(format!(
                "invalid compression mode '{other}', expected 'none', 'file' or 'message'"
            ))),
        }
    }
}

/// Manifest describing one logical bag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagMetadata {
    /// Metadata layout version
    pub version: u32,
    /// Storage backend identifier (e.g., "rec")
    pub storage_identifier: String,
    /// Physical files relative to the bag directory, in write order
    pub relative_file_paths: Vec<String>,
    /// Per-file statistics, parallel to `relative_file_paths`
    #[serde(default)]
    pub files: Vec<FileInformation>,
    /// Every topic of the bag with its record count
    pub topics_with_message_count: Vec<TopicInformation>,
    /// Compression codec identifier, empty when uncompressed
    #[serde(default)]
    pub compression_format: String,
    /// Compression granularity
    #[serde(default)]
    pub compression_mode: CompressionMode,
    /// Earliest timestamp (nanoseconds)
    pub starting_time: u64,
    /// Latest timestamp minus `starting_time` (nanoseconds)
    pub duration: u64,
    /// Sum of all file sizes in bytes
    pub bag_size: u64,
    /// Total record count
    pub message_count: u64,
}

impl Default for BagMetadata {
    fn default() -> Self {
        Self {
            version: METADATA_VERSION,
            storage_identifier: String::new(),
            relative_file_paths: Vec::new(),
            files: Vec::new(),
            topics_with_message_count: Vec::new(),
            compression_format: String::new(),
            compression_mode: CompressionMode::None,
            starting_time: 0,
            duration: 0,
            bag_size: 0,
            message_count: 0,
        }
    }
}

impl BagMetadata {
    /// Create metadata for a bag that is about to be written.
    ///
    /// `starting_time` starts at the maximum value so the first record
    /// always lowers it.
    pub fn for_recording(storage_identifier: impl Into<String>) -> Self {
        Self {
            storage_identifier: storage_identifier.into(),
            starting_time: u64::MAX,
            ..Self::default()
        }
    }

    /// Compression mode that actually applies to this bag.
    ///
    /// A bag without a compression format is uncompressed regardless of the
    /// recorded mode.
    pub fn effective_compression_mode(&self) -> CompressionMode {
        if self.compression_format.is_empty() {
            CompressionMode::None
        } else {
            self.compression_mode
        }
    }

    /// Latest timestamp in the bag, if any record was written.
    pub fn end_time(&self) -> Option<u64> {
        if self.message_count == 0 {
            None
        } else {
            Some(self.starting_time.saturating_add(self.duration))
        }
    }

    /// Get topic information by name.
    pub fn topic(&self, name: &str) -> Option<&TopicInformation> {
        self.topics_with_message_count
            .iter()
            .find(|t| t.topic_metadata.name == name)
    }

    /// Check that every topic shares one serialization format.
    ///
    /// Returns the shared format, or `None` for a bag without topics.
    pub fn common_serialization_format(&self) -> Result<Option<&str>> {
        let Some(first) = self.topics_with_message_count.first() else {
            return Ok(None);
        };
        let expected = first.topic_metadata.serialization_format.as_str();
        for topic in &self.topics_with_message_count {
            let found = &topic.topic_metadata.serialization_format;
            if found != expected {
                return Err(BagError::FormatMismatch {
                    topic: topic.topic_metadata.name.clone(),
                    expected: expected.to_string(),
                    found: found.clone(),
                });
            }
        }
        Ok(Some(expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(name: &str, format: &str, count: u64) -> TopicInformation {
        TopicInformation {
            topic_metadata: TopicMetadata::new(name, "std_msgs/msg/String", format),
            message_count: count,
        }
    }

    #[test]
    fn test_topic_metadata_builder() {
        let meta = TopicMetadata::new("/chatter", "std_msgs/msg/String", "cdr")
            .with_qos_profiles("- history: 3");
        assert_eq!(meta.name, "/chatter");
        assert_eq!(meta.topic_type, "std_msgs/msg/String");
        assert_eq!(meta.serialization_format, "cdr");
        assert_eq!(meta.offered_qos_profiles, "- history: 3");
    }

    #[test]
    fn test_compression_mode_parse() {
        assert_eq!(
            "FILE".parse::<CompressionMode>().unwrap(),
            CompressionMode::File
        );
        assert_eq!(
            "message".parse::<CompressionMode>().unwrap(),
            CompressionMode::Message
        );
        assert_eq!("".parse::<CompressionMode>().unwrap(), CompressionMode::None);
        assert!("chunk".parse::<CompressionMode>().is_err());
        assert_eq!(CompressionMode::File.to_string(), "file");
    }

    #[test]
    fn test_file_information_time_bounds() {
        let mut info = FileInformation::new("bag_0.rec");
        info.record(200);
        info.record(100);
        info.record(350);
        assert_eq!(info.starting_time, 100);
        assert_eq!(info.duration, 250);
        assert_eq!(info.message_count, 3);
    }

    #[test]
    fn test_common_serialization_format() {
        let mut meta = BagMetadata::default();
        assert_eq!(meta.common_serialization_format().unwrap(), None);

        meta.topics_with_message_count = vec![topic("/a", "cdr", 1), topic("/b", "cdr", 2)];
        assert_eq!(meta.common_serialization_format().unwrap(), Some("cdr"));

        meta.topics_with_message_count.push(topic("/c", "json", 0));
        let err = meta.common_serialization_format().unwrap_err();
        match err {
            BagError::FormatMismatch {
                topic,
                expected,
                found,
            } => {
                assert_eq!(topic, "/c");
                assert_eq!(expected, "cdr");
                assert_eq!(found, "json");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_effective_compression_mode() {
        let mut meta = BagMetadata {
            compression_mode: CompressionMode::File,
            ..BagMetadata::default()
        };
        assert_eq!(meta.effective_compression_mode(), CompressionMode::None);
        meta.compression_format = "zstd".to_string();
        assert_eq!(meta.effective_compression_mode(), CompressionMode::File);
    }

    #[test]
    fn test_metadata_json_shape() {
        let meta = BagMetadata {
            topics_with_message_count: vec![topic("/a", "cdr", 3)],
            compression_mode: CompressionMode::Message,
            ..BagMetadata::default()
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["compression_mode"], "message");
        assert_eq!(
            json["topics_with_message_count"][0]["topic_metadata"]["type"],
            "std_msgs/msg/String"
        );
    }
}
