// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Topics command - list the topics of a bag.

use std::path::PathBuf;

use clap::Args;

use crate::common::{read_metadata, Result};

/// List topics.
#[derive(Args, Clone, Debug)]
pub struct TopicsCmd {
    /// Bag directory
    #[arg(value_name = "BAG")]
    input: PathBuf,

    /// Show message counts
    #[arg(long)]
    counts: bool,
}

impl TopicsCmd {
    pub fn run(self) -> Result<()> {
        let metadata = read_metadata(&self.input)?;

        for topic in &metadata.topics_with_message_count {
            let meta = &topic.topic_metadata;
            if self.counts {
                println!("{}\t{}\t{}", meta.name, meta.topic_type, topic.message_count);
            } else {
                println!("{}\t{}", meta.name, meta.topic_type);
            }
        }

        Ok(())
    }
}
