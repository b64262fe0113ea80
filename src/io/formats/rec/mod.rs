// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! REC record-file storage backend.
//!
//! A REC file holds the records of one physical bag file:
//!
//! ```text
//! magic: "#ROBOBAG REC1\n\0\0"           (16 bytes)
//! frame*: op:u8 | len:u32 LE | body[len] | crc32:u32 LE
//! ```
//!
//! The CRC covers the op byte and the body. Frame bodies:
//! - `0x01` topic: `id:u32`, then name, type, serialization format and
//!   QoS profiles, each as `len:u32 LE | utf8 bytes`
//! - `0x02` message: `topic_id:u32 | timestamp:u64 | payload`
//! - `0x03` remove topic: `id:u32`
//!
//! Topic frames precede the messages that reference them, so a file can be
//! read front to back in one pass.

// Reader implementation
pub mod reader;

// Writer implementation
pub mod writer;

pub use reader::RecReader;
pub use writer::RecWriter;

use std::io::{self, Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::io::metadata::TopicMetadata;

/// Storage identifier of this backend.
pub const STORAGE_ID: &str = "rec";

/// File extension appended to storage URIs.
pub const EXTENSION: &str = "rec";

/// File magic.
pub const MAGIC: &[u8; 16] = b"#ROBOBAG REC1\n\0\0";

/// Topic definition frame.
const OP_TOPIC: u8 = 0x01;
/// Message frame.
const OP_MESSAGE: u8 = 0x02;
/// Topic removal frame.
const OP_REMOVE_TOPIC: u8 = 0x03;

/// Bytes of framing around a body: op, length and CRC.
const FRAME_OVERHEAD: usize = 1 + 4 + 4;

/// A decoded frame borrowing from the file contents.
#[derive(Debug, PartialEq, Eq)]
enum Frame<'a> {
    Topic { id: u32, topic: TopicMetadata },
    Message { topic_id: u32, timestamp: u64, payload: &'a [u8] },
    RemoveTopic { id: u32 },
}

fn invalid_data(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}

fn encode_frame(op: u8, body: &[u8]) -> io::Result<Vec<u8>> {
    let len = u32::try_from(body.len())
        .map_err(|_| invalid_data(format!("frame body of {} bytes is too large", body.len())))?;
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&[op]);
    hasher.update(body);

    let mut frame = Vec::with_capacity(body.len() + FRAME_OVERHEAD);
    frame.push(op);
    frame.write_u32::<LittleEndian>(len)?;
    frame.extend_from_slice(body);
    frame.write_u32::<LittleEndian>(hasher.finalize())?;
    Ok(frame)
}

fn write_string(buf: &mut Vec<u8>, value: &str) -> io::Result<()> {
    let len = u32::try_from(value.len())
        .map_err(|_| invalid_data(format!("string of {} bytes is too large", value.len())))?;
    buf.write_u32::<LittleEndian>(len)?;
    buf.extend_from_slice(value.as_bytes());
    Ok(())
}

fn read_string(cursor: &mut Cursor<&[u8]>) -> io::Result<String> {
    let len = cursor.read_u32::<LittleEndian>()? as usize;
    let remaining = cursor.get_ref().len() - cursor.position() as usize;
    if len > remaining {
        return Err(invalid_data(format!(
            "string of {len} bytes overruns its frame ({remaining} bytes left)"
        )));
    }
    let mut bytes = vec![0u8; len];
    cursor.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| invalid_data(format!("invalid UTF-8 string: {e}")))
}

fn encode_topic(id: u32, topic: &TopicMetadata) -> io::Result<Vec<u8>> {
    let mut body = Vec::new();
    body.write_u32::<LittleEndian>(id)?;
    write_string(&mut body, &topic.name)?;
    write_string(&mut body, &topic.topic_type)?;
    write_string(&mut body, &topic.serialization_format)?;
    write_string(&mut body, &topic.offered_qos_profiles)?;
    encode_frame(OP_TOPIC, &body)
}

fn encode_message(topic_id: u32, timestamp: u64, payload: &[u8]) -> io::Result<Vec<u8>> {
    let mut body = Vec::with_capacity(12 + payload.len());
    body.write_u32::<LittleEndian>(topic_id)?;
    body.write_u64::<LittleEndian>(timestamp)?;
    body.extend_from_slice(payload);
    encode_frame(OP_MESSAGE, &body)
}

fn encode_remove_topic(id: u32) -> io::Result<Vec<u8>> {
    let mut body = Vec::with_capacity(4);
    body.write_u32::<LittleEndian>(id)?;
    encode_frame(OP_REMOVE_TOPIC, &body)
}

/// Decode the frame starting at `offset`.
///
/// Returns `None` at the end of the data, otherwise the frame and the
/// offset of the next one.
fn read_frame(data: &[u8], offset: usize) -> io::Result<Option<(Frame<'_>, usize)>> {
    if offset == data.len() {
        return Ok(None);
    }
    let header_end = offset + 5;
    if header_end > data.len() {
        return Err(invalid_data(format!("truncated frame header at offset {offset}")));
    }
    let op = data[offset];
    let len = u32::from_le_bytes([
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
        data[offset + 4],
    ]) as usize;
    let body_end = header_end
        .checked_add(len)
        .filter(|end| end + 4 <= data.len())
        .ok_or_else(|| invalid_data(format!("truncated frame at offset {offset}")))?;
    let body = &data[header_end..body_end];
    let stored_crc = u32::from_le_bytes([
        data[body_end],
        data[body_end + 1],
        data[body_end + 2],
        data[body_end + 3],
    ]);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&[op]);
    hasher.update(body);
    let crc = hasher.finalize();
    if crc != stored_crc {
        return Err(invalid_data(format!(
            "CRC mismatch at offset {offset}: stored {stored_crc:#010x}, computed {crc:#010x}"
        )));
    }

    let frame = decode_body(op, body).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            invalid_data(format!("frame body at offset {offset} is too short"))
        } else {
            e
        }
    })?;
    Ok(Some((frame, body_end + 4)))
}

fn decode_body(op: u8, body: &[u8]) -> io::Result<Frame<'_>> {
    let mut cursor = Cursor::new(body);
    match op {
        OP_TOPIC => {
            let id = cursor.read_u32::<LittleEndian>()?;
            let name = read_string(&mut cursor)?;
            let topic_type = read_string(&mut cursor)?;
            let format = read_string(&mut cursor)?;
            let qos = read_string(&mut cursor)?;
            Ok(Frame::Topic {
                id,
                topic: TopicMetadata::new(name, topic_type, format).with_qos_profiles(qos),
            })
        }
        OP_MESSAGE => {
            let topic_id = cursor.read_u32::<LittleEndian>()?;
            let timestamp = cursor.read_u64::<LittleEndian>()?;
            Ok(Frame::Message {
                topic_id,
                timestamp,
                payload: &body[12..],
            })
        }
        OP_REMOVE_TOPIC => Ok(Frame::RemoveTopic {
            id: cursor.read_u32::<LittleEndian>()?,
        }),
        other => Err(invalid_data(format!("unknown frame op {other:#04x}"))),
    }
}
