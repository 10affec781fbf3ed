//! Output sink for a stream download.
//!
//! Segments are appended to a `.part` temp file. On success the file is
//! flushed, synced and renamed to drop the suffix; dropping the sink on any
//! other path closes and deletes the temp file.

mod sink;

pub use sink::SegmentSink;

use std::path::{Path, PathBuf};

/// Temporary file suffix used until the sink is finalized.
pub const TEMP_SUFFIX: &str = ".part";

/// Final path for a temp file: strips a trailing `.part` (e.g. `a.mp4.part` → `a.mp4`).
pub fn final_path_for(temp_path: &Path) -> PathBuf {
    let s = temp_path.as_os_str().to_string_lossy();
    match s.strip_suffix(TEMP_SUFFIX) {
        Some(stem) => PathBuf::from(stem),
        None => temp_path.to_path_buf(),
    }
}
