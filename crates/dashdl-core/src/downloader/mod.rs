//! Ordered concurrent stream downloader.
//!
//! Fetches the initialization segment, estimates the number of media segments
//! from the presentation duration, fetches them with a bounded worker pool and
//! appends them to a temp file strictly in segment order.
//!
//! The segment count is an estimate from the manifest's coarse duration and is
//! trusted as is: the stream may end one segment earlier (the last request
//! then fails and aborts the download) or later (the tail is not fetched).

mod estimate;
mod reassembly;
mod run;

pub use estimate::estimate_segment_count;

use std::io;
use std::path::PathBuf;
use std::sync::mpsc::Sender;

use crate::control::{CancelToken, Cancelled};
use crate::fetch::{fetch, FetchError, FetchOptions};
use crate::model::StreamDescriptor;
use crate::storage::SegmentSink;
use crate::url_model::{resolve, AddressError};

use run::{run_concurrent, SegmentSource};

/// Number of concurrent segment fetches when not configured otherwise.
pub const DEFAULT_WORKERS: usize = 5;

/// Settings for one stream download.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Size of the worker pool (at least 1).
    pub workers: usize,
    pub fetch: FetchOptions,
    /// Directory for the `.part` sink file.
    pub temp_dir: PathBuf,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            fetch: FetchOptions::default(),
            temp_dir: std::env::temp_dir(),
        }
    }
}

/// Sent after every segment written to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentProgress {
    /// Media segments written so far.
    pub written: u64,
    /// Estimated number of media segments.
    pub total: u64,
}

/// Why a stream download did not complete.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("failed to resolve segment URL")]
    Address(#[from] AddressError),
    #[error("failed to download initialization segment")]
    InitSegment(#[source] FetchError),
    #[error("failed to download segment {index}")]
    Segment {
        index: u64,
        #[source]
        source: FetchError,
    },
    #[error("download cancelled")]
    Cancelled,
    #[error("failed to write stream output")]
    Io(#[from] io::Error),
    #[error("segment count for {total_secs}s at {segment_secs}s per segment does not fit in 64 bits")]
    SegmentCount { total_secs: f64, segment_secs: f64 },
    #[error("segment numbers {start} + {count} overflow 64 bits")]
    SegmentRange { start: u64, count: u64 },
    #[error("stream stopped after {written} of {expected} segments ({buffered} out of order)")]
    Incomplete {
        expected: u64,
        written: u64,
        buffered: usize,
    },
}

impl DownloadError {
    /// Cancellation is a user stop rather than a failure to report.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DownloadError::Cancelled)
    }
}

impl From<Cancelled> for DownloadError {
    fn from(_: Cancelled) -> Self {
        DownloadError::Cancelled
    }
}

/// Downloads one stream and returns the path of the finalized output file.
///
/// The file contains the initialization segment followed by media segments
/// `start_number..start_number + n` concatenated, where `n` comes from
/// [`estimate_segment_count`]. Segment numbers that overflow `u64` fail
/// before any request is made. On any error the temp file is removed and
/// nothing is returned; the caller owns the returned file on success.
pub fn download_stream(
    base_url: &str,
    stream: &StreamDescriptor,
    total_duration_secs: f64,
    options: &DownloadOptions,
    cancel: &CancelToken,
    progress: Option<&Sender<SegmentProgress>>,
) -> Result<PathBuf, DownloadError> {
    cancel.check()?;
    tracing::info!(
        stream = %stream.id,
        bandwidth = stream.bandwidth,
        "starting stream download"
    );

    let template = &stream.template;
    let segment_secs = template.segment_duration_secs();
    let count = estimate_segment_count(total_duration_secs, segment_secs).ok_or(
        DownloadError::SegmentCount {
            total_secs: total_duration_secs,
            segment_secs,
        },
    )?;
    tracing::info!(
        stream = %stream.id,
        segments = count,
        segment_secs,
        start = template.start_number,
        "estimated media segments"
    );

    if template.start_number.checked_add(count).is_none() {
        return Err(DownloadError::SegmentRange {
            start: template.start_number,
            count,
        });
    }

    let mut sink = SegmentSink::create(&options.temp_dir, &stream.id)?;

    let init_url = resolve(base_url, &template.initialization_path(&stream.id))?;
    tracing::info!(url = %init_url, "downloading initialization segment");
    let init = fetch(&init_url, &options.fetch, cancel).map_err(|e| {
        if e.is_aborted() || cancel.is_cancelled() {
            DownloadError::Cancelled
        } else {
            DownloadError::InitSegment(e)
        }
    })?;
    sink.append(&init)?;

    let source = SegmentSource {
        base_url,
        stream,
        fetch: &options.fetch,
    };
    let written = run_concurrent(
        &source,
        template.start_number,
        count,
        options.workers,
        &mut sink,
        cancel,
        progress,
    )?;

    let bytes = sink.bytes_written();
    let path = sink.finalize()?;
    tracing::info!(
        stream = %stream.id,
        segments = written,
        bytes,
        path = %path.display(),
        "stream download complete"
    );
    Ok(path)
}
