// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! REC file reader.
//!
//! The file is memory-mapped and scanned once at open, which validates
//! every frame and collects the topic table and statistics. Records are then
//! decoded lazily in file order.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use super::{invalid_data, read_frame, Frame, EXTENSION, MAGIC, STORAGE_ID};
use crate::io::metadata::{BagMetadata, FileInformation, TopicInformation, TopicMetadata};
use crate::io::paths;
use crate::io::traits::Storage;
use crate::{BagError, Result, SerializedRecord};

/// Sequential reader for one REC file.
pub struct RecReader {
    /// Path of the file, including the extension
    path: PathBuf,
    /// Memory-mapped file contents
    mmap: memmap2::Mmap,
    /// Offset of the next frame to decode
    offset: usize,
    /// Topic names by id, for every topic ever defined
    topic_names: HashMap<u32, String>,
    /// Record counts of the topics still live at the end of the file
    topics: Vec<TopicInformation>,
    /// Statistics collected by the open-time scan
    stats: FileInformation,
    /// Record decoded by `has_next` but not yet returned
    pending: Option<SerializedRecord>,
}

impl RecReader {
    /// Open `<uri>.rec`.
    pub fn open(uri: &Path) -> Result<Self> {
        let path = paths::append_suffix(uri, EXTENSION);
        let file =
            File::open(&path).map_err(|e| BagError::io(format!("opening {}", path.display()), e))?;
        let file_size = file
            .metadata()
            .map_err(|e| BagError::io(format!("reading metadata of {}", path.display()), e))?
            .len();
        if file_size < MAGIC.len() as u64 {
            return Err(BagError::io(
                format!("opening {}", path.display()),
                invalid_data(format!("file of {file_size} bytes is too short for a REC header")),
            ));
        }

        // SAFETY: the file is opened read-only and not modified while mapped.
        let mmap = unsafe { memmap2::Mmap::map(&file) }
            .map_err(|e| BagError::io(format!("mapping {}", path.display()), e))?;
        if &mmap[..MAGIC.len()] != MAGIC {
            return Err(BagError::io(
                format!("opening {}", path.display()),
                invalid_data("not a REC file (bad magic)"),
            ));
        }

        let mut reader = Self {
            stats: FileInformation::new(paths::relative_to(
                path.parent().unwrap_or_else(|| Path::new("")),
                &path,
            )),
            path,
            mmap,
            offset: MAGIC.len(),
            topic_names: HashMap::new(),
            topics: Vec::new(),
            pending: None,
        };
        reader.scan()?;
        Ok(reader)
    }

    /// Validate every frame and build the topic table.
    fn scan(&mut self) -> Result<()> {
        let mut offset = MAGIC.len();
        let mut live: Vec<(u32, TopicInformation)> = Vec::new();
        while let Some((frame, next)) =
            read_frame(&self.mmap, offset).map_err(|e| self.read_error(e))?
        {
            match frame {
                Frame::Topic { id, topic } => {
                    self.topic_names.insert(id, topic.name.clone());
                    live.retain(|(_, t)| t.topic_metadata.name != topic.name);
                    live.push((id, TopicInformation::new(topic)));
                }
                Frame::RemoveTopic { id } => live.retain(|(live_id, _)| *live_id != id),
                Frame::Message {
                    topic_id,
                    timestamp,
                    ..
                } => {
                    if !self.topic_names.contains_key(&topic_id) {
                        return Err(self.read_error(invalid_data(format!(
                            "record at offset {offset} references undefined topic id {topic_id}"
                        ))));
                    }
                    if let Some((_, info)) = live.iter_mut().find(|(id, _)| *id == topic_id) {
                        info.message_count += 1;
                    }
                    self.stats.record(timestamp);
                }
            }
            offset = next;
        }
        self.topics = live.into_iter().map(|(_, info)| info).collect();
        Ok(())
    }

    fn read_error(&self, e: std::io::Error) -> BagError {
        BagError::io(format!("reading {}", self.path.display()), e)
    }

    /// Decode frames until the next message or the end of the file.
    fn advance(&mut self) -> Result<Option<SerializedRecord>> {
        while let Some((frame, next)) =
            read_frame(&self.mmap, self.offset).map_err(|e| self.read_error(e))?
        {
            self.offset = next;
            if let Frame::Message {
                topic_id,
                timestamp,
                payload,
            } = frame
            {
                let topic = self.topic_names.get(&topic_id).ok_or_else(|| {
                    self.read_error(invalid_data(format!("undefined topic id {topic_id}")))
                })?;
                return Ok(Some(SerializedRecord::new(
                    topic.clone(),
                    timestamp,
                    payload.to_vec(),
                )));
            }
        }
        Ok(None)
    }
}

impl Storage for RecReader {
    fn has_next(&mut self) -> Result<bool> {
        if self.pending.is_none() {
            self.pending = self.advance()?;
        }
        Ok(self.pending.is_some())
    }

    fn read_next(&mut self) -> Result<SerializedRecord> {
        if self.has_next()? {
            self.pending.take().ok_or(BagError::Exhausted)
        } else {
            Err(BagError::Exhausted)
        }
    }

    fn write(&mut self, _record: SerializedRecord) -> Result<()> {
        Err(BagError::io(
            format!("writing {}", self.path.display()),
            std::io::Error::new(std::io::ErrorKind::Unsupported, "file is opened read-only"),
        ))
    }

    fn create_topic(&mut self, topic: &TopicMetadata) -> Result<()> {
        Err(BagError::io(
            format!("creating topic '{}' in {}", topic.name, self.path.display()),
            std::io::Error::new(std::io::ErrorKind::Unsupported, "file is opened read-only"),
        ))
    }

    fn remove_topic(&mut self, topic: &TopicMetadata) -> Result<()> {
        Err(BagError::io(
            format!("removing topic '{}' from {}", topic.name, self.path.display()),
            std::io::Error::new(std::io::ErrorKind::Unsupported, "file is opened read-only"),
        ))
    }

    fn get_all_topics_and_types(&self) -> Vec<TopicMetadata> {
        self.topics.iter().map(|t| t.topic_metadata.clone()).collect()
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
            topics_with_message_count: self.topics.clone(),
            starting_time: if has_records { self.stats.starting_time } else { 0 },
            duration: self.stats.duration,
            bag_size: self.mmap.len() as u64,
            message_count: self.stats.message_count,
            ..BagMetadata::default()
        }
    }

    fn get_bagfile_size(&self) -> u64 {
        self.mmap.len() as u64
    }

    fn get_storage_identifier(&self) -> &str {
        STORAGE_ID
    }

    fn close(&mut self) -> Result<()> {
        self.pending = None;
        self.offset = self.mmap.len();
        Ok(())
    }
}
