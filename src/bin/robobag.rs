// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Robobag CLI
//!
//! Command-line tool for inspecting, replaying and re-recording bags.
//!
//! ## Usage
//!
//! ```sh
//! # Show bag information
//! robobag info recordings/run_1
//!
//! # List topics with message counts
//! robobag topics recordings/run_1 --counts
//!
//! # Print records of matching topics
//! robobag dump recordings/run_1 --topic '^/camera' --limit 10
//!
//! # Re-record with splitting and compression
//! robobag convert recordings/run_1 recordings/run_1_zstd \
//!     --compression-format zstd --compression-mode file
//!
//! # Record stdin lines
//! echo hello | robobag record recordings/chat --topic /chatter:std_msgs/msg/String
//! ```

mod cmd;
mod common;

use std::process;

use clap::{Parser, Subcommand};
use cmd::{ConvertCmd, DumpCmd, InfoCmd, RecordCmd, TopicsCmd};
use common::Result;

/// Robobag - append-only message bag toolkit
///
/// Inspect, replay and re-record multi-file bags.
#[derive(Parser, Clone)]
#[command(name = "robobag")]
#[command(about = "Append-only message bag toolkit", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// Show bag metadata summary
    Info(InfoCmd),

    /// List topics
    Topics(TopicsCmd),

    /// Print records, one line each
    Dump(DumpCmd),

    /// Re-record a bag with new split, compression or format settings
    Convert(ConvertCmd),

    /// Record stdin lines into a new bag
    Record(RecordCmd),
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    common::init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Info(cmd) => cmd.run(),
        Commands::Topics(cmd) => cmd.run(),
        Commands::Dump(cmd) => cmd.run(),
        Commands::Convert(cmd) => cmd.run(),
        Commands::Record(cmd) => cmd.run(),
    }
}

fn main() {
    let result = run();

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
