// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Path derivation shared by the writer, the reader and the codecs.
//!
//! A physical bag file is named `<bag>_<index>.<backend-ext>` and, once
//! compressed, gets `.<codec-ext>` appended. Every helper here is pure and
//! comes in inverse pairs:
//!
//! | forward                  | inverse                     |
//! |--------------------------|-----------------------------|
//! | [`append_suffix`]        | [`strip_suffix`]            |
//! | backend adds `.<ext>`    | [`strip_storage_extension`] |

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Name of the bag, taken from the last component of its directory.
///
/// Trailing separators are ignored, so `"runs/day1/"` and `"runs/day1"`
/// both name the bag `"day1"`.
pub fn bag_name(base_folder: &Path) -> String {
    base_folder
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bag".to_string())
}

/// Storage URI (without backend extension) of the file with the given index.
pub fn storage_uri(base_folder: &Path, index: usize) -> PathBuf {
    base_folder.join(format!("{}_{}", bag_name(base_folder), index))
}

/// Append `.<suffix>` to a path.
pub fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(".");
    os.push(suffix);
    PathBuf::from(os)
}

/// Remove a trailing `.<suffix>` added by [`append_suffix`].
///
/// Returns `None` if the path does not end with that suffix.
pub fn strip_suffix(path: &Path, suffix: &str) -> Option<PathBuf> {
    let bytes = path.as_os_str().as_encoded_bytes();
    let stripped = bytes.strip_suffix(suffix.as_bytes())?.strip_suffix(b".")?;
    match stripped.last() {
        None => return None,
        Some(&last) if std::path::is_separator(char::from(last)) => return None,
        Some(_) => {}
    }
    // SAFETY: `stripped` is a prefix of `as_encoded_bytes` output ending
    // right before an ASCII `.`, which is a valid split point.
    let stripped = unsafe { OsStr::from_encoded_bytes_unchecked(stripped) };
    Some(PathBuf::from(stripped))
}

/// Remove the storage backend's extension, giving the URI the backend
/// factory expects.
pub fn strip_storage_extension(path: &Path) -> PathBuf {
    path.with_extension("")
}

/// Resolve a path stored in the metadata against the bag directory.
///
/// Absolute paths are kept as they are.
pub fn resolve(base_folder: &Path, relative: &str) -> PathBuf {
    let relative = Path::new(relative);
    if relative.is_absolute() {
        relative.to_path_buf()
    } else {
        base_folder.join(relative)
    }
}

/// Express a path relative to the bag directory for the metadata.
pub fn relative_to(base_folder: &Path, path: &Path) -> String {
    path.strip_prefix(base_folder)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}
