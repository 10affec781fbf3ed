//! CLI command handlers.

mod check;
mod download;
mod progress;

pub use check::run_check_dependencies;
pub use download::{run_download, DownloadRequest};
