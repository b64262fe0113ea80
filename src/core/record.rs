// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Serialized record type.

/// One timestamped, topic-tagged binary payload.
///
/// A record is owned by exactly one pipeline stage at a time and is moved
/// from stage to stage. The payload length is the length of the buffer;
/// stages that compress, decompress or convert the payload swap in a new
/// buffer with [`replace_payload`](SerializedRecord::replace_payload), which
/// drops the old one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedRecord {
    /// Serialized message bytes
    pub payload: Vec<u8>,
    /// Receive timestamp in nanoseconds
    pub timestamp: u64,
    /// Topic the record was published on
    pub topic_name: String,
}

impl SerializedRecord {
    /// Create a new record.
    pub fn new(topic_name: impl Into<String>, timestamp: u64, payload: Vec<u8>) -> Self {
        Self {
            payload,
            timestamp,
            topic_name: topic_name.into(),
        }
    }

    /// Get the payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Check if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Replace the payload, returning the previous buffer.
    pub fn replace_payload(&mut self, payload: Vec<u8>) -> Vec<u8> {
        std::mem::replace(&mut self.payload, payload)
    }

    /// Consume the record, returning it with a new payload.
    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }
}
