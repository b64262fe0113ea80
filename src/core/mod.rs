// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout robobag.
//!
//! - [`BagError`] - Error taxonomy shared by every component
//! - [`SerializedRecord`] - The unit of data moved through the pipeline

pub mod error;
pub mod record;

pub use error::{BagError, Result};
pub use record::SerializedRecord;
