// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! REC file writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{encode_message, encode_remove_topic, encode_topic, EXTENSION, MAGIC, STORAGE_ID};
use crate::io::metadata::{BagMetadata, FileInformation, TopicInformation, TopicMetadata};
use crate::io::paths;
use crate::io::traits::Storage;
use crate::{BagError, Result, SerializedRecord};

/// A topic registered in the file being written.
#[derive(Debug, Clone)]
struct TopicEntry {
    id: u32,
    metadata: TopicMetadata,
    message_count: u64,
}

/// Append-only writer for one REC file.
///
/// Frames go through a buffered writer; [`Storage::get_bagfile_size`]
/// reports every byte handed to it, buffered or not.
pub struct RecWriter {
    /// Path of the file, including the extension
    path: PathBuf,
    /// Output, `None` once closed
    writer: Option<BufWriter<File>>,
    /// Bytes written so far, including the magic
    bytes_written: u64,
    /// Live topics in creation order
    topics: Vec<TopicEntry>,
    /// Next topic id to hand out
    next_topic_id: u32,
    /// Time bounds and count of the records written
    stats: FileInformation,
}

impl RecWriter {
    /// Create `<uri>.rec`, truncating an existing file.
    pub fn create(uri: &Path) -> Result<Self> {
        let path = paths::append_suffix(uri, EXTENSION);
        let file = File::create(&path)
            .map_err(|e| BagError::io(format!("creating {}", path.display()), e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(MAGIC)
            .map_err(|e| BagError::io(format!("writing header of {}", path.display()), e))?;

        debug!(path = %path.display(), "Created REC file");
        Ok(Self {
            stats: FileInformation::new(paths::relative_to(
                path.parent().unwrap_or_else(|| Path::new("")),
                &path,
            )),
            path,
            writer: Some(writer),
            bytes_written: MAGIC.len() as u64,
            topics: Vec::new(),
            next_topic_id: 0,
        })
    }

    fn append(&mut self, frame: &[u8]) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| BagError::not_open("writing to a closed REC file"))?;
        writer
            .write_all(frame)
            .map_err(|e| BagError::io(format!("writing {}", self.path.display()), e))?;
        self.bytes_written += frame.len() as u64;
        Ok(())
    }

    fn encode_error(&self, e: std::io::Error) -> BagError {
        BagError::io(format!("encoding frame for {}", self.path.display()), e)
    }
}

impl Storage for RecWriter {
    fn has_next(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn read_next(&mut self) -> Result<SerializedRecord> {
        Err(BagError::io(
            format!("reading {}", self.path.display()),
            std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "file is opened for writing",
            ),
        ))
    }

    fn write(&mut self, record: SerializedRecord) -> Result<()> {
        let index = self
            .topics
            .iter()
            .position(|t| t.metadata.name == record.topic_name)
            .ok_or_else(|| BagError::unknown_topic(&record.topic_name))?;
        let frame = encode_message(self.topics[index].id, record.timestamp, &record.payload)
            .map_err(|e| self.encode_error(e))?;
        self.append(&frame)?;

        self.topics[index].message_count += 1;
        self.stats.record(record.timestamp);
        Ok(())
    }

    fn create_topic(&mut self, topic: &TopicMetadata) -> Result<()> {
        if let Some(existing) = self.topics.iter().find(|t| t.metadata.name == topic.name) {
            if existing.metadata == *topic {
                return Ok(());
            }
            return Err(BagError::duplicate_topic(&topic.name));
        }

        let id = self.next_topic_id;
        let frame = encode_topic(id, topic).map_err(|e| self.encode_error(e))?;
        self.append(&frame)?;
        self.next_topic_id += 1;
        self.topics.push(TopicEntry {
            id,
            metadata: topic.clone(),
            message_count: 0,
        });
        Ok(())
    }

    fn remove_topic(&mut self, topic: &TopicMetadata) -> Result<()> {
        let Some(index) = self.topics.iter().position(|t| t.metadata.name == topic.name) else {
            return Ok(());
        };
        let frame = encode_remove_topic(self.topics[index].id).map_err(|e| self.encode_error(e))?;
        self.append(&frame)?;
        self.topics.remove(index);
        Ok(())
    }

    fn get_all_topics_and_types(&self) -> Vec<TopicMetadata> {
        self.topics.iter().map(|t| t.metadata.clone()).collect()
    }

    fn get_relative_path(&self) -> &Path {
        &self.path
    }

    fn get_metadata(&self) -> BagMetadata {
        let has_records = self.stats.message_count > 0;
        BagMetadata {
            storage_identifier: STORAGE_ID.to_string(),
            relative_file_paths: vec![self.stats.path.clone()],
            files: vec![self.stats.clone()],
            topics_with_message_count: self
                .topics
                .iter()
                .map(|t| TopicInformation {
                    topic_metadata: t.metadata.clone(),
                    message_count: t.message_count,
                })
                .collect(),
            starting_time: if has_records { self.stats.starting_time } else { 0 },
            duration: self.stats.duration,
            bag_size: self.bytes_written,
            message_count: self.stats.message_count,
            ..BagMetadata::default()
        }
    }

    fn get_bagfile_size(&self) -> u64 {
        self.bytes_written
    }

    fn get_storage_identifier(&self) -> &str {
        STORAGE_ID
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer
                .flush()
                .map_err(|e| BagError::io(format!("flushing {}", self.path.display()), e))?;
            debug!(
                path = %self.path.display(),
                bytes = self.bytes_written,
                records = self.stats.message_count,
                "Closed REC file"
            );
        }
        Ok(())
    }
}

impl Drop for RecWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to close REC file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(name: &str) -> TopicMetadata {
        TopicMetadata::new(name, "std_msgs/msg/String", "json")
    }

    #[test]
    fn test_create_writes_magic() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = RecWriter::create(&dir.path().join("bag_0")).unwrap();
        assert_eq!(writer.get_bagfile_size(), 16);
        assert_eq!(writer.get_relative_path(), dir.path().join("bag_0.rec"));
        writer.close().unwrap();
        assert_eq!(std::fs::read(dir.path().join("bag_0.rec")).unwrap(), MAGIC);
    }

    #[test]
    fn test_size_counts_buffered_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = RecWriter::create(&dir.path().join("bag_0")).unwrap();
        writer.create_topic(&topic("/a")).unwrap();
        let before = writer.get_bagfile_size();
        writer
            .write(SerializedRecord::new("/a", 1, vec![0u8; 100]))
            .unwrap();
        // 9 bytes framing + 12 bytes header + payload
        assert_eq!(writer.get_bagfile_size(), before + 121);
        writer.close().unwrap();
        assert_eq!(
            std::fs::metadata(dir.path().join("bag_0.rec")).unwrap().len(),
            writer.get_bagfile_size()
        );
    }

    #[test]
    fn test_write_unknown_topic() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = RecWriter::create(&dir.path().join("bag_0")).unwrap();
        let err = writer
            .write(SerializedRecord::new("/missing", 1, vec![1]))
            .unwrap_err();
        assert!(matches!(err, BagError::UnknownTopic { .. }));
    }

    #[test]
    fn test_create_topic_idempotent_and_conflicting() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = RecWriter::create(&dir.path().join("bag_0")).unwrap();
        writer.create_topic(&topic("/a")).unwrap();
        let size = writer.get_bagfile_size();
        writer.create_topic(&topic("/a")).unwrap();
        assert_eq!(writer.get_bagfile_size(), size);

        let other = TopicMetadata::new("/a", "other/Type", "json");
        assert!(matches!(
            writer.create_topic(&other),
            Err(BagError::DuplicateTopic { .. })
        ));
    }

    #[test]
    fn test_metadata_tracks_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = RecWriter::create(&dir.path().join("bag_0")).unwrap();
        writer.create_topic(&topic("/a")).unwrap();
        writer.create_topic(&topic("/b")).unwrap();
        writer.write(SerializedRecord::new("/a", 30, vec![1])).unwrap();
        writer.write(SerializedRecord::new("/b", 10, vec![2])).unwrap();
        writer.write(SerializedRecord::new("/a", 50, vec![3])).unwrap();

        let meta = writer.get_metadata();
        assert_eq!(meta.storage_identifier, "rec");
        assert_eq!(meta.relative_file_paths, vec!["bag_0.rec".to_string()]);
        assert_eq!(meta.message_count, 3);
        assert_eq!(meta.starting_time, 10);
        assert_eq!(meta.duration, 40);
        assert_eq!(meta.topic("/a").unwrap().message_count, 2);
        assert_eq!(meta.topic("/b").unwrap().message_count, 1);
    }

    #[test]
    fn test_remove_topic() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = RecWriter::create(&dir.path().join("bag_0")).unwrap();
        writer.create_topic(&topic("/a")).unwrap();
        writer.remove_topic(&topic("/a")).unwrap();
        assert!(writer.get_all_topics_and_types().is_empty());
        assert!(writer
            .write(SerializedRecord::new("/a", 1, vec![1]))
            .is_err());
    }

    #[test]
    fn test_write_after_close_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = RecWriter::create(&dir.path().join("bag_0")).unwrap();
        writer.create_topic(&topic("/a")).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();
        assert!(writer
            .write(SerializedRecord::new("/a", 1, vec![1]))
            .is_err());
    }
}
