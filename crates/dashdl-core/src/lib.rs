//! dashdl core: ordered, concurrent download of DASH segment streams.
//!
//! The pipeline is manifest → representation selection → per-stream
//! [`downloader::download_stream`] → [`merge::Merger`].

pub mod config;
pub mod logging;

pub mod control;
pub mod downloader;
pub mod fetch;
pub mod manifest;
pub mod merge;
pub mod model;
pub mod storage;
pub mod url_model;
