// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Convert command - re-record a bag with new settings.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use robobag::{BagConfig, CompressionMode, ConverterOptions, TopicMetadata, Writer};

use crate::common::{open_reader, read_metadata, ProgressBar, Result};

/// Re-record a bag with new split, compression or format settings.
#[derive(Args, Clone, Debug)]
pub struct ConvertCmd {
    /// Input bag directory
    #[arg(value_name = "IN")]
    input: PathBuf,

    /// Output bag directory
    #[arg(value_name = "OUT")]
    output: PathBuf,

    /// TOML file with storage, converter and compression settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Split threshold in bytes (0 = never split)
    #[arg(long)]
    max_bagfile_size: Option<u64>,

    /// Compression codec (zstd, lz4, bz2)
    #[arg(long)]
    compression_format: Option<String>,

    /// Compression granularity (none, file, message)
    #[arg(long)]
    compression_mode: Option<CompressionMode>,

    /// Serialization format of the output bag
    #[arg(long, value_name = "FORMAT")]
    output_format: Option<String>,
}

impl ConvertCmd {
    /// Merge the configuration file with the command-line overrides.
    fn config(&self) -> Result<BagConfig> {
        let mut config = match &self.config {
            Some(path) => BagConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => BagConfig::default(),
        };
        config.storage.uri = self.output.clone();
        if let Some(size) = self.max_bagfile_size {
            config.storage.max_bagfile_size = size;
        }
        if let Some(format) = &self.compression_format {
            config.compression.compression_format = format.clone();
            if self.compression_mode.is_none() && config.compression.mode == CompressionMode::None
            {
                config.compression.mode = CompressionMode::File;
            }
        }
        if let Some(mode) = self.compression_mode {
            config.compression.mode = mode;
        }
        if let Some(format) = &self.output_format {
            config.converter.output_serialization_format = format.clone();
        }
        config.compression.validate()?;
        Ok(config)
    }

    pub fn run(self) -> Result<()> {
        let config = self.config()?;
        let metadata = read_metadata(&self.input)?;
        let output_format = config.converter.output_serialization_format.clone();

        let mut reader = open_reader(&self.input, &ConverterOptions::new("", &output_format))?;
        let mut writer = Writer::with_compression(config.compression.clone())?;
        writer
            .open(&config.storage, &ConverterOptions::default())
            .with_context(|| format!("opening output bag {}", self.output.display()))?;

        for topic in &metadata.topics_with_message_count {
            let meta = &topic.topic_metadata;
            let format = if output_format.is_empty() {
                meta.serialization_format.clone()
            } else {
                output_format.clone()
            };
            writer.create_topic(
                &TopicMetadata::new(&meta.name, &meta.topic_type, format)
                    .with_qos_profiles(meta.offered_qos_profiles.clone()),
            )?;
        }

        let progress = ProgressBar::new(metadata.message_count, "Converting");
        let mut count = 0u64;
        for record in reader.records() {
            writer.write(record?)?;
            progress.inc();
            count += 1;
        }
        reader.close()?;
        writer.close()?;

        let files = writer.metadata().relative_file_paths.len();
        progress.finish_with_message(format!("{count} records"));
        println!(
            "Converted {} records into {} ({} file{})",
            count,
            self.output.display(),
            files,
            if files == 1 { "" } else { "s" }
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd() -> ConvertCmd {
        ConvertCmd {
            input: PathBuf::from("in"),
            output: PathBuf::from("out"),
            config: None,
            max_bagfile_size: None,
            compression_format: None,
            compression_mode: None,
            output_format: None,
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = cmd().config().unwrap();
        assert_eq!(config.storage.uri, PathBuf::from("out"));
        assert!(!config.compression.is_enabled());
    }

    #[test]
    fn test_codec_implies_file_mode() {
        let mut cmd = cmd();
        cmd.compression_format = Some("zstd".to_string());
        let config = cmd.config().unwrap();
        assert_eq!(config.compression.mode, CompressionMode::File);

        cmd.compression_mode = Some(CompressionMode::Message);
        assert_eq!(cmd.config().unwrap().compression.mode, CompressionMode::Message);
    }

    #[test]
    fn test_mode_without_codec_rejected() {
        let mut cmd = cmd();
        cmd.compression_mode = Some(CompressionMode::File);
        assert!(cmd.config().is_err());
    }
}
