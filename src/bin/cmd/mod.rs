// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI subcommands.

mod convert;
mod dump;
mod info;
mod record;
mod topics;

pub use convert::ConvertCmd;
pub use dump::DumpCmd;
pub use info::InfoCmd;
pub use record::RecordCmd;
pub use topics::TopicsCmd;
