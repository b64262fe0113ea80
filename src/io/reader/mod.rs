// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Sequential bag reader.
//!
//! The [`SequentialReader`] walks the files of a bag in the order recorded
//! in its metadata. Compressed files are decompressed next to the original
//! when the reader reaches them, and removed again once it moves on. Each
//! record passes through:
//!
//! 1. the storage backend
//! 2. the decompressor, in message mode
//! 3. the converter, if the requested output format differs from the
//!    bag's serialization format
//! 4. the topic filter

pub mod builder;

pub use builder::ReaderBuilder;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::compression::{CompressionFactory, Decompressor};
use crate::convert::{Converter, ConverterRegistry};
use crate::io::filter::TopicFilter;
use crate::io::metadata::{BagMetadata, CompressionMode, TopicMetadata};
use crate::io::metadata_io::MetadataIo;
use crate::io::options::{ConverterOptions, StorageOptions};
use crate::io::paths;
use crate::io::traits::{Storage, StorageFactory};
use crate::{BagError, Result, SerializedRecord};

/// State of an open reader.
struct Session {
    /// Bag directory
    base_folder: PathBuf,
    /// Storage backend identifier
    storage_id: String,
    /// Open storage file
    storage: Box<dyn Storage>,
    /// Index of the open file in `relative_file_paths`
    file_index: usize,
    /// Codec, when the bag is compressed
    decompressor: Option<Box<dyn Decompressor>>,
    /// Compression granularity
    mode: CompressionMode,
    /// Payload transcoding, when a different output format was requested
    converter: Option<Converter>,
    /// Decompressed copy of the open file, removed when leaving it
    scratch: Option<PathBuf>,
    /// Record read from storage that passed the filter but was not returned
    pending: Option<SerializedRecord>,
}

impl Session {
    fn remove_scratch(&mut self) {
        if let Some(path) = self.scratch.take() {
            remove_scratch_file(&path);
        }
    }
}

/// Reads the records of a bag in write order.
///
/// States: closed, open on file `i`, exhausted. Every operation other than
/// [`open`](SequentialReader::open), [`close`](SequentialReader::close) and
/// the filter setters fails with [`BagError::NotOpen`] while closed.
pub struct SequentialReader {
    storage_factory: Box<dyn StorageFactory>,
    metadata_io: Box<dyn MetadataIo>,
    converter_registry: Arc<ConverterRegistry>,
    compression_factory: CompressionFactory,
    filter: TopicFilter,
    /// Metadata of the open bag, or of the last one opened
    metadata: BagMetadata,
    session: Option<Session>,
}

impl Default for SequentialReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SequentialReader {
    /// Create a reader with the default collaborators.
    pub fn new() -> Self {
        ReaderBuilder::new().build()
    }

    /// Create a builder for a reader with custom collaborators.
    pub fn builder() -> ReaderBuilder {
        ReaderBuilder::new()
    }

    /// Open the bag at `storage_options.uri`.
    ///
    /// The bag's serialization formats are validated before any file is
    /// touched. In file mode only the first file is decompressed here.
    pub fn open(
        &mut self,
        storage_options: &StorageOptions,
        converter_options: &ConverterOptions,
    ) -> Result<()> {
        if let Some(session) = &self.session {
            return Err(BagError::AlreadyOpen {
                uri: session.base_folder.display().to_string(),
            });
        }

        let base_folder = storage_options.uri.clone();
        let metadata = self.metadata_io.read_metadata(&base_folder)?;
        let storage_format = metadata.common_serialization_format()?.map(str::to_string);
        if metadata.relative_file_paths.is_empty() {
            return Err(BagError::metadata(
                base_folder.display().to_string(),
                "bag lists no storage files",
            ));
        }

        let mode = metadata.effective_compression_mode();
        let decompressor = if mode == CompressionMode::None {
            None
        } else {
            let decompressor = self
                .compression_factory
                .create_decompressor(&metadata.compression_format)?;
            if !decompressor
                .identifier()
                .eq_ignore_ascii_case(&metadata.compression_format)
            {
                return Err(BagError::codec(
                    decompressor.identifier(),
                    format!(
                        "bag is compressed with '{}'",
                        metadata.compression_format
                    ),
                ));
            }
            Some(decompressor)
        };

        let converter = match storage_format.as_deref() {
            Some(input)
                if !converter_options.output_serialization_format.is_empty()
                    && converter_options.output_serialization_format != input =>
            {
                let mut converter = Converter::new(
                    input,
                    &converter_options.output_serialization_format,
                    &self.converter_registry,
                )?;
                for topic in &metadata.topics_with_message_count {
                    converter.add_topic(
                        &topic.topic_metadata.name,
                        &topic.topic_metadata.topic_type,
                    );
                }
                Some(converter)
            }
            _ => None,
        };

        let storage_id = if metadata.storage_identifier.is_empty() {
            storage_options.storage_id.clone()
        } else {
            metadata.storage_identifier.clone()
        };

        let (storage, scratch) = open_file(
            self.storage_factory.as_ref(),
            &base_folder,
            &storage_id,
            &metadata.relative_file_paths[0],
            decompressor.as_deref().filter(|_| mode == CompressionMode::File),
        )?;

        info!(
            uri = %base_folder.display(),
            files = metadata.relative_file_paths.len(),
            messages = metadata.message_count,
            compression_format = %metadata.compression_format,
            compression_mode = %mode,
            "Opened bag for reading"
        );

        self.metadata = metadata;
        self.session = Some(Session {
            base_folder,
            storage_id,
            storage,
            file_index: 0,
            decompressor,
            mode,
            converter,
            scratch,
            pending: None,
        });
        Ok(())
    }

    /// Whether another record passing the filter remains.
    ///
    /// Moves on to the next files of the bag as the current one runs out.
    pub fn has_next(&mut self) -> Result<bool> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| BagError::not_open("checking for records"))?;

        loop {
            if let Some(pending) = &session.pending {
                if self.filter.should_include(&pending.topic_name) {
                    return Ok(true);
                }
                session.pending = None;
            }

            if session.storage.has_next()? {
                let record = session.storage.read_next()?;
                if self.filter.should_include(&record.topic_name) {
                    session.pending = Some(record);
                }
                continue;
            }

            let next_index = session.file_index + 1;
            if next_index >= self.metadata.relative_file_paths.len() {
                return Ok(false);
            }
            session.storage.close()?;
            session.remove_scratch();
            let decompressor = session
                .decompressor
                .as_deref()
                .filter(|_| session.mode == CompressionMode::File);
            let (storage, scratch) = open_file(
                self.storage_factory.as_ref(),
                &session.base_folder,
                &session.storage_id,
                &self.metadata.relative_file_paths[next_index],
                decompressor,
            )?;
            session.storage = storage;
            session.scratch = scratch;
            session.file_index = next_index;
            debug!(index = next_index, "Advanced to next bag file");
        }
    }

    /// Read the next record passing the filter.
    ///
    /// Fails with [`BagError::Exhausted`] past the last record.
    pub fn read_next(&mut self) -> Result<SerializedRecord> {
        if !self.has_next()? {
            return Err(BagError::Exhausted);
        }
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| BagError::not_open("reading"))?;
        let record = session.pending.take().ok_or(BagError::Exhausted)?;

        let record = match (&session.decompressor, session.mode) {
            (Some(decompressor), CompressionMode::Message) => {
                decompressor.decompress_record(record)?
            }
            _ => record,
        };
        match &session.converter {
            Some(converter) => converter.convert(record),
            None => Ok(record),
        }
    }

    /// Topics of the open storage file.
    pub fn get_all_topics_and_types(&self) -> Result<Vec<TopicMetadata>> {
        self.session
            .as_ref()
            .map(|s| s.storage.get_all_topics_and_types())
            .ok_or_else(|| BagError::not_open("listing topics"))
    }

    /// Only return records of topics passing `filter`.
    pub fn set_filter(&mut self, filter: TopicFilter) {
        self.filter = filter;
    }

    /// Return records of every topic again.
    pub fn reset_filter(&mut self) {
        self.filter = TopicFilter::All;
    }

    /// Current topic filter.
    pub fn filter(&self) -> &TopicFilter {
        &self.filter
    }

    /// Metadata of the open bag, or of the last one opened.
    pub fn metadata(&self) -> &BagMetadata {
        &self.metadata
    }

    /// Whether the reader is open.
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Index of the file being read.
    pub fn current_file_index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.file_index)
    }

    /// Iterate over the remaining records.
    pub fn records(&mut self) -> Records<'_> {
        Records {
            reader: self,
            failed: false,
        }
    }

    /// Close the bag, removing any decompressed scratch file.
    ///
    /// Closing a reader that is not open does nothing.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };
        let result = session.storage.close();
        session.remove_scratch();
        debug!(uri = %session.base_folder.display(), "Closed bag reader");
        result
    }
}

impl Drop for SequentialReader {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "Failed to close bag reader");
        }
    }
}

/// Iterator over the records of a [`SequentialReader`].
///
/// Stops after the first error.
pub struct Records<'a> {
    reader: &'a mut SequentialReader,
    failed: bool,
}

impl Iterator for Records<'_> {
    type Item = Result<SerializedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = match self.reader.has_next() {
            Ok(true) => self.reader.read_next(),
            Ok(false) => return None,
            Err(e) => Err(e),
        };
        self.failed = result.is_err();
        Some(result)
    }
}

/// Remove a decompressed copy, logging if it cannot be removed.
fn remove_scratch_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed decompressed file"),
        Err(e) => warn!(
            path = %path.display(),
            error = %e,
            "Failed to remove decompressed file"
        ),
    }
}

/// Open one file of a bag, decompressing it first when a file-mode
/// decompressor is given.
///
/// Returns the storage and the decompressed scratch file, if any.
fn open_file(
    factory: &dyn StorageFactory,
    base_folder: &Path,
    storage_id: &str,
    relative: &str,
    decompressor: Option<&dyn Decompressor>,
) -> Result<(Box<dyn Storage>, Option<PathBuf>)> {
    let path = paths::resolve(base_folder, relative);
    let (storage_path, scratch) = match decompressor {
        Some(decompressor) => {
            let decompressed = decompressor.decompress_file(&path)?;
            (decompressed.clone(), Some(decompressed))
        }
        None => (path, None),
    };
    let uri = paths::strip_storage_extension(&storage_path);
    match factory.open_read_only(&uri, storage_id) {
        Some(storage) => Ok((storage, scratch)),
        None => {
            if let Some(scratch) = &scratch {
                remove_scratch_file(scratch);
            }
            Err(BagError::storage_open(uri.display().to_string(), storage_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::metadata::TopicMetadata;
    use crate::io::metadata_io::JsonMetadataIo;
    use crate::Writer;

    fn topic(name: &str, format: &str) -> TopicMetadata {
        TopicMetadata::new(name, "std_msgs/msg/String", format)
    }

    fn write_bag(dir: &Path, records: &[(&str, u64)]) {
        let mut writer = Writer::new();
        writer
            .open(&StorageOptions::new(dir), &ConverterOptions::default())
            .unwrap();
        for (name, _) in records {
            writer.create_topic(&topic(name, "json")).unwrap();
        }
        for (name, ts) in records {
            writer
                .write(SerializedRecord::new(*name, *ts, format!("{ts}").into_bytes()))
                .unwrap();
        }
        writer.close().unwrap();
    }

    #[test]
    fn test_operations_require_open() {
        let mut reader = SequentialReader::new();
        assert!(matches!(reader.has_next(), Err(BagError::NotOpen { .. })));
        assert!(matches!(reader.read_next(), Err(BagError::NotOpen { .. })));
        assert!(matches!(
            reader.get_all_topics_and_types(),
            Err(BagError::NotOpen { .. })
        ));
        assert!(reader.close().is_ok());
    }

    #[test]
    fn test_read_all_then_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let bag = dir.path().join("bag");
        write_bag(&bag, &[("/a", 1), ("/b", 2), ("/a", 3)]);

        let mut reader = SequentialReader::new();
        reader
            .open(&StorageOptions::new(&bag), &ConverterOptions::default())
            .unwrap();
        let timestamps: Vec<u64> = reader
            .records()
            .map(|r| r.unwrap().timestamp)
            .collect();
        assert_eq!(timestamps, vec![1, 2, 3]);
        assert!(!reader.has_next().unwrap());
        assert!(matches!(reader.read_next(), Err(BagError::Exhausted)));
    }

    #[test]
    fn test_open_twice_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let bag = dir.path().join("bag");
        write_bag(&bag, &[("/a", 1)]);
        let mut reader = SequentialReader::new();
        let options = StorageOptions::new(&bag);
        reader.open(&options, &ConverterOptions::default()).unwrap();
        assert!(matches!(
            reader.open(&options, &ConverterOptions::default()),
            Err(BagError::AlreadyOpen { .. })
        ));
    }

    #[test]
    fn test_missing_bag() {
        let dir = tempfile::tempdir().unwrap();
        let mut reader = SequentialReader::new();
        let err = reader
            .open(
                &StorageOptions::new(dir.path().join("nothing")),
                &ConverterOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, BagError::Metadata { .. }));
    }

    #[test]
    fn test_filter() {
        let dir = tempfile::tempdir().unwrap();
        let bag = dir.path().join("bag");
        write_bag(&bag, &[("/a", 1), ("/b", 2), ("/a", 3), ("/b", 4)]);

        let mut reader = SequentialReader::new();
        reader
            .open(&StorageOptions::new(&bag), &ConverterOptions::default())
            .unwrap();
        reader.set_filter(TopicFilter::include(["/b"]));
        assert_eq!(reader.read_next().unwrap().timestamp, 2);
        reader.reset_filter();
        assert_eq!(reader.read_next().unwrap().timestamp, 3);
        reader.set_filter(TopicFilter::exclude(["/a"]));
        assert_eq!(reader.read_next().unwrap().timestamp, 4);
        assert!(!reader.has_next().unwrap());
    }

    #[test]
    fn test_filter_drops_pending_record() {
        let dir = tempfile::tempdir().unwrap();
        let bag = dir.path().join("bag");
        write_bag(&bag, &[("/a", 1), ("/b", 2)]);

        let mut reader = SequentialReader::new();
        reader
            .open(&StorageOptions::new(&bag), &ConverterOptions::default())
            .unwrap();
        assert!(reader.has_next().unwrap());
        reader.set_filter(TopicFilter::include(["/b"]));
        assert_eq!(reader.read_next().unwrap().topic_name, "/b");
    }

    #[test]
    fn test_format_mismatch_rejected_before_files() {
        let dir = tempfile::tempdir().unwrap();
        let bag = dir.path().join("bag");
        std::fs::create_dir_all(&bag).unwrap();
        let mut meta = BagMetadata {
            storage_identifier: "rec".to_string(),
            relative_file_paths: vec!["does_not_exist.rec".to_string()],
            ..BagMetadata::default()
        };
        meta.topics_with_message_count = vec![
            crate::io::metadata::TopicInformation::new(topic("/a", "cdr")),
            crate::io::metadata::TopicInformation::new(topic("/b", "json")),
        ];
        JsonMetadataIo.write_metadata(&bag, &meta).unwrap();

        let mut reader = SequentialReader::new();
        let err = reader
            .open(&StorageOptions::new(&bag), &ConverterOptions::default())
            .unwrap_err();
        assert!(matches!(err, BagError::FormatMismatch { .. }));
        assert!(!reader.is_open());
    }

    #[test]
    fn test_missing_storage_file() {
        let dir = tempfile::tempdir().unwrap();
        let bag = dir.path().join("bag");
        std::fs::create_dir_all(&bag).unwrap();
        let meta = BagMetadata {
            storage_identifier: "rec".to_string(),
            relative_file_paths: vec!["bag_0.rec".to_string()],
            ..BagMetadata::default()
        };
        JsonMetadataIo.write_metadata(&bag, &meta).unwrap();

        let mut reader = SequentialReader::new();
        assert!(matches!(
            reader.open(&StorageOptions::new(&bag), &ConverterOptions::default()),
            Err(BagError::StorageOpen { .. })
        ));
    }

    #[test]
    fn test_compression_format_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let bag = dir.path().join("bag");
        write_bag(&bag, &[("/a", 1)]);
        let mut meta = JsonMetadataIo.read_metadata(&bag).unwrap();
        meta.compression_format = "zst".to_string();
        meta.compression_mode = CompressionMode::Message;
        JsonMetadataIo.write_metadata(&bag, &meta).unwrap();

        let mut reader = SequentialReader::new();
        assert!(matches!(
            reader.open(&StorageOptions::new(&bag), &ConverterOptions::default()),
            Err(BagError::Codec { .. })
        ));
    }

    #[test]
    fn test_output_format_conversion() {
        let dir = tempfile::tempdir().unwrap();
        let bag = dir.path().join("bag");
        write_bag(&bag, &[("/a", 7)]);

        let mut reader = SequentialReader::new();
        reader
            .open(&StorageOptions::new(&bag), &ConverterOptions::new("", "text"))
            .unwrap();
        // "7" as JSON is the number 7, written by the text plugin as "7".
        assert_eq!(reader.read_next().unwrap().payload, b"7");
    }

    #[test]
    fn test_topics_and_close() {
        let dir = tempfile::tempdir().unwrap();
        let bag = dir.path().join("bag");
        write_bag(&bag, &[("/a", 1), ("/b", 2)]);

        let mut reader = SequentialReader::new();
        reader
            .open(&StorageOptions::new(&bag), &ConverterOptions::default())
            .unwrap();
        let names: Vec<String> = reader
            .get_all_topics_and_types()
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["/a", "/b"]);
        assert_eq!(reader.current_file_index(), Some(0));
        reader.close().unwrap();
        reader.close().unwrap();
        assert!(!reader.is_open());
        assert_eq!(reader.metadata().message_count, 2);
    }

    /// Storage factory that refuses every read-only open.
    struct NoReadFactory;

    impl StorageFactory for NoReadFactory {
        fn open_read_only(&self, _uri: &Path, _storage_id: &str) -> Option<Box<dyn Storage>> {
            None
        }

        fn open_read_write(&self, uri: &Path, storage_id: &str) -> Option<Box<dyn Storage>> {
            crate::io::factory::DefaultStorageFactory.open_read_write(uri, storage_id)
        }
    }

    #[test]
    fn test_failed_open_removes_decompressed_file() {
        let dir = tempfile::tempdir().unwrap();
        let bag = dir.path().join("bag");
        let mut writer =
            Writer::with_compression(crate::CompressionOptions::new("zstd", CompressionMode::File))
                .unwrap();
        writer
            .open(&StorageOptions::new(&bag), &ConverterOptions::default())
            .unwrap();
        writer.create_topic(&topic("/a", "json")).unwrap();
        writer
            .write(SerializedRecord::new("/a", 1, b"1".to_vec()))
            .unwrap();
        writer.close().unwrap();
        assert!(bag.join("bag_0.rec.zstd").exists());

        let mut reader = SequentialReader::builder()
            .storage_factory(Box::new(NoReadFactory))
            .build();
        let err = reader
            .open(&StorageOptions::new(&bag), &ConverterOptions::default())
            .unwrap_err();
        assert!(matches!(err, BagError::StorageOpen { .. }));
        assert!(!bag.join("bag_0.rec").exists());
        assert!(bag.join("bag_0.rec.zstd").exists());
    }
}
