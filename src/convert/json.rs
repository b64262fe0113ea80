// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Built-in converter plugins.

use serde_json::Value;

use super::SerializationFormatConverter;
use crate::{BagError, Result};

/// Payloads that are JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonConverter;

impl SerializationFormatConverter for JsonConverter {
    fn serialization_format(&self) -> &str {
        "json"
    }

    fn deserialize(&self, payload: &[u8], topic_type: &str) -> Result<Value> {
        serde_json::from_slice(payload)
            .map_err(|e| BagError::conversion(topic_type, format!("invalid JSON payload: {e}")))
    }

    fn serialize(&self, value: &Value, topic_type: &str) -> Result<Vec<u8>> {
        serde_json::to_vec(value)
            .map_err(|e| BagError::conversion(topic_type, format!("cannot encode JSON: {e}")))
    }
}

/// Payloads that are plain UTF-8 text.
///
/// Text decodes to a JSON string. Encoding a string yields its contents;
/// any other value is written as compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextConverter;

impl SerializationFormatConverter for TextConverter {
    fn serialization_format(&self) -> &str {
        "text"
    }

    fn deserialize(&self, payload: &[u8], topic_type: &str) -> Result<Value> {
        std::str::from_utf8(payload)
            .map(|s| Value::String(s.to_string()))
            .map_err(|e| BagError::conversion(topic_type, format!("payload is not UTF-8: {e}")))
    }

    fn serialize(&self, value: &Value, _topic_type: &str) -> Result<Vec<u8>> {
        Ok(match value {
            Value::String(s) => s.as_bytes().to_vec(),
            other => other.to_string().into_bytes(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_round_trip() {
        let value = JsonConverter
            .deserialize(br#"{"position": [1.0, 2.5], "name": "arm"}"#, "pkg/msg/Joint")
            .unwrap();
        assert_eq!(value, json!({"position": [1.0, 2.5], "name": "arm"}));
        let bytes = JsonConverter.serialize(&value, "pkg/msg/Joint").unwrap();
        assert_eq!(JsonConverter.deserialize(&bytes, "pkg/msg/Joint").unwrap(), value);
    }

    #[test]
    fn test_json_rejects_garbage() {
        assert!(matches!(
            JsonConverter.deserialize(b"\x00\x01", "t"),
            Err(BagError::Conversion { .. })
        ));
    }

    #[test]
    fn test_text_plugin() {
        let value = TextConverter.deserialize("héllo".as_bytes(), "t").unwrap();
        assert_eq!(value, json!("héllo"));
        assert_eq!(TextConverter.serialize(&value, "t").unwrap(), "héllo".as_bytes());
        assert_eq!(TextConverter.serialize(&json!([1, 2]), "t").unwrap(), b"[1,2]");
        assert!(TextConverter.deserialize(&[0xFF, 0xFE], "t").is_err());
    }
}
