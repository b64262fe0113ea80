// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Dump command - print the records of a bag, one line each.

use std::io::Write as _;
use std::path::PathBuf;

use clap::Args;
use robobag::{ConverterOptions, SerializedRecord, TopicFilter};

use crate::common::{open_reader, Result};

/// Print records, one line each.
#[derive(Args, Clone, Debug)]
pub struct DumpCmd {
    /// Bag directory
    #[arg(value_name = "BAG")]
    input: PathBuf,

    /// Only print topics matching this regular expression
    #[arg(short, long, value_name = "REGEX")]
    topic: Option<String>,

    /// Stop after this many records
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Print payloads as hex instead of text
    #[arg(long)]
    hex: bool,

    /// Convert payloads to this serialization format
    #[arg(long, value_name = "FORMAT")]
    output_format: Option<String>,
}

impl DumpCmd {
    pub fn run(self) -> Result<()> {
        let converter = ConverterOptions::new("", self.output_format.clone().unwrap_or_default());
        let mut reader = open_reader(&self.input, &converter)?;
        if let Some(pattern) = &self.topic {
            reader.set_filter(TopicFilter::regex(pattern)?);
        }

        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let limit = self.limit.unwrap_or(usize::MAX);
        for record in reader.records().take(limit) {
            writeln!(out, "{}", self.format_record(&record?))?;
        }
        reader.close()?;
        Ok(())
    }

    fn format_record(&self, record: &SerializedRecord) -> String {
        let payload = if self.hex {
            hex::encode(&record.payload)
        } else {
            String::from_utf8_lossy(&record.payload).into_owned()
        };
        format!("{} {} {}", record.timestamp, record.topic_name, payload)
    }
}
