// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Info command - show a bag's metadata summary.

use std::path::PathBuf;

use clap::Args;

use crate::common::{format_duration, format_size, format_timestamp, read_metadata, Result};

/// Show bag metadata summary.
#[derive(Args, Clone, Debug)]
pub struct InfoCmd {
    /// Bag directory
    #[arg(value_name = "BAG")]
    input: PathBuf,
}

impl InfoCmd {
    pub fn run(self) -> Result<()> {
        let metadata = read_metadata(&self.input)?;

        println!("=== {} ===", self.input.display());
        println!("Storage: {}", metadata.storage_identifier);
        println!("Size: {}", format_size(metadata.bag_size));
        println!("Messages: {}", metadata.message_count);
        if metadata.compression_format.is_empty() {
            println!("Compression: none");
        } else {
            println!(
                "Compression: {} ({})",
                metadata.compression_format, metadata.compression_mode
            );
        }

        if let Some(end) = metadata.end_time() {
            println!("Start: {}", format_timestamp(metadata.starting_time));
            println!("End: {}", format_timestamp(end));
            println!("Duration: {}", format_duration(metadata.duration));
        }

        println!();
        println!("Files:");
        for file in &metadata.files {
            println!(
                "  {} | {} messages | {}",
                file.path,
                file.message_count,
                format_duration(file.duration)
            );
        }

        println!();
        println!("Topics:");
        for topic in &metadata.topics_with_message_count {
            let meta = &topic.topic_metadata;
            println!(
                "  {} | {} | {} | {} messages",
                meta.name, meta.topic_type, meta.serialization_format, topic.message_count
            );
        }

        Ok(())
    }
}
