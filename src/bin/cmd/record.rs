// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record command - write stdin lines into a new bag.
//!
//! Each line becomes one record stamped with the wall clock. With several
//! topics, a line starting with `<topic> ` goes to that topic; every other
//! line goes to the first topic.

use std::io::BufRead as _;
use std::path::PathBuf;

use anyhow::{bail, Context as _};
use clap::Args;
use robobag::{BagConfig, ConverterOptions, SerializedRecord, TopicMetadata, Writer};

use crate::common::{now_nanos, Result};

/// Record stdin lines into a new bag.
#[derive(Args, Clone, Debug)]
pub struct RecordCmd {
    /// Output bag directory
    #[arg(value_name = "BAG")]
    output: PathBuf,

    /// Topic to record, as NAME:TYPE (repeatable)
    #[arg(short, long = "topic", value_name = "NAME:TYPE", required = true)]
    topics: Vec<String>,

    /// Serialization format of the payloads
    #[arg(short, long, default_value = "text")]
    format: String,

    /// TOML file with storage and compression settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Split threshold in bytes (0 = never split)
    #[arg(long)]
    max_bagfile_size: Option<u64>,
}

impl RecordCmd {
    fn topic_metadata(&self) -> Result<Vec<TopicMetadata>> {
        self.topics
            .iter()
            .map(|topic| match topic.split_once(':') {
                Some((name, topic_type)) if !name.is_empty() && !topic_type.is_empty() => {
                    Ok(TopicMetadata::new(name, topic_type, &self.format))
                }
                _ => bail!("invalid topic '{topic}', expected NAME:TYPE"),
            })
            .collect()
    }

    pub fn run(self) -> Result<()> {
        let topics = self.topic_metadata()?;
        let mut config = match &self.config {
            Some(path) => BagConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => BagConfig::default(),
        };
        config.storage.uri = self.output.clone();
        if let Some(size) = self.max_bagfile_size {
            config.storage.max_bagfile_size = size;
        }

        let mut writer = Writer::with_compression(config.compression)?;
        writer
            .open(&config.storage, &ConverterOptions::default())
            .with_context(|| format!("opening bag {}", self.output.display()))?;
        for topic in &topics {
            writer.create_topic(topic)?;
        }

        let mut count = 0u64;
        for line in std::io::stdin().lock().lines() {
            let line = line.context("reading stdin")?;
            let (topic, payload) = route(&topics, &line);
            writer.write(SerializedRecord::new(
                topic,
                now_nanos(),
                payload.as_bytes().to_vec(),
            ))?;
            count += 1;
        }
        writer.close()?;

        println!("Recorded {} records into {}", count, self.output.display());
        Ok(())
    }
}

/// Pick the topic a line is published on, and its payload.
fn route<'a>(topics: &'a [TopicMetadata], line: &'a str) -> (&'a str, &'a str) {
    if topics.len() > 1 {
        for topic in topics {
            if let Some(rest) = line
                .strip_prefix(topic.name.as_str())
                .and_then(|rest| rest.strip_prefix(' '))
            {
                return (topic.name.as_str(), rest);
            }
        }
    }
    (topics[0].name.as_str(), line)
}
