// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Storage backend implementations.
//!
//! - [`rec`]: framed, checksummed record files (`.rec`)

pub mod rec;
