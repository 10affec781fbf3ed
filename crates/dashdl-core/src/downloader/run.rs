//! Bounded worker pool and the in-order collector.

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::control::CancelToken;
use crate::fetch::{fetch, FetchError, FetchOptions};
use crate::model::StreamDescriptor;
use crate::url_model::{resolve, AddressError};

use super::reassembly::ReassemblyBuffer;
use super::{DownloadError, SegmentProgress};

/// Failure of one media segment, before it is tied to the whole download.
#[derive(Debug)]
pub(super) enum SegmentError {
    Address(AddressError),
    Fetch(FetchError),
}

impl SegmentError {
    fn into_download_error(self, index: u64) -> DownloadError {
        match self {
            SegmentError::Address(e) => DownloadError::Address(e),
            SegmentError::Fetch(source) => DownloadError::Segment { index, source },
        }
    }
}

/// Published exactly once per dispatched index, unless the pool was cancelled.
#[derive(Debug)]
pub(super) struct SegmentResult {
    pub(super) index: u64,
    pub(super) outcome: Result<Vec<u8>, SegmentError>,
}

/// What a worker needs to turn an index into bytes.
pub(super) struct SegmentSource<'a> {
    pub(super) base_url: &'a str,
    pub(super) stream: &'a StreamDescriptor,
    pub(super) fetch: &'a FetchOptions,
}

impl SegmentSource<'_> {
    fn fetch_segment(&self, index: u64, cancel: &CancelToken) -> Result<Vec<u8>, SegmentError> {
        let path = self.stream.template.media_path(index, &self.stream.id);
        let url = resolve(self.base_url, &path).map_err(SegmentError::Address)?;
        fetch(&url, self.fetch, cancel).map_err(SegmentError::Fetch)
    }
}

/// Fetches segments `[start, start + count)` with `workers` threads and
/// writes them to `sink` strictly in index order. Returns the number of
/// segments written.
///
/// Workers claim indices from a shared cursor, so each index is fetched at
/// most once and nothing is allocated per segment up front. The first failed
/// segment stops the pool; buffered payloads are dropped, not written. All
/// workers are joined before returning.
pub(super) fn run_concurrent<W: Write>(
    source: &SegmentSource<'_>,
    start: u64,
    count: u64,
    workers: usize,
    sink: &mut W,
    cancel: &CancelToken,
    progress: Option<&Sender<SegmentProgress>>,
) -> Result<u64, DownloadError> {
    if count == 0 {
        return Ok(0);
    }
    let end = start
        .checked_add(count)
        .ok_or(DownloadError::SegmentRange { start, count })?;
    let cursor = SegmentCursor::new(start, end);
    let pool = cancel.child();
    let (tx, rx) = mpsc::channel();
    let num_workers = workers
        .max(1)
        .min(usize::try_from(count).unwrap_or(usize::MAX));

    thread::scope(|s| {
        for worker in 0..num_workers {
            let tx = tx.clone();
            let cursor = &cursor;
            let pool = &pool;
            let spawned = thread::Builder::new()
                .name(format!("segment-worker-{worker}"))
                .spawn_scoped(s, move || worker_loop(cursor, source, pool, tx));
            if let Err(e) = spawned {
                pool.cancel();
                return Err(DownloadError::Io(e));
            }
        }
        drop(tx);

        let result = collect_in_order(rx, start, count, sink, cancel, progress);
        if result.is_err() {
            // Stop queued and in-flight fetches; the scope joins the workers.
            pool.cancel();
        }
        result
    })
}

/// Hands out `[next, end)` one index at a time.
struct SegmentCursor {
    next: AtomicU64,
    end: u64,
}

impl SegmentCursor {
    fn new(start: u64, end: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
            end,
        }
    }

    /// Claims the next index; never advances past `end`.
    fn claim(&self) -> Option<u64> {
        self.next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |i| (i < self.end).then(|| i + 1))
            .ok()
    }
}

fn worker_loop(
    cursor: &SegmentCursor,
    source: &SegmentSource<'_>,
    pool: &CancelToken,
    results: Sender<SegmentResult>,
) {
    loop {
        if pool.is_cancelled() {
            break;
        }
        let index = match cursor.claim() {
            Some(i) => i,
            None => break,
        };
        let outcome = source.fetch_segment(index, pool);
        if pool.is_cancelled() {
            break;
        }
        if results.send(SegmentResult { index, outcome }).is_err() {
            // Collector is gone.
            break;
        }
    }
}

/// Consumes results in arrival order and writes them in index order.
///
/// Each arrival is buffered, then every payload contiguous with the cursor is
/// flushed. A failure returns immediately without touching the buffer.
pub(super) fn collect_in_order<W: Write>(
    results: Receiver<SegmentResult>,
    start: u64,
    count: u64,
    sink: &mut W,
    cancel: &CancelToken,
    progress: Option<&Sender<SegmentProgress>>,
) -> Result<u64, DownloadError> {
    let mut buffer = ReassemblyBuffer::new(start);

    for SegmentResult { index, outcome } in results.iter() {
        if cancel.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }
        let payload = match outcome {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(index, buffered = buffer.len(), "segment failed: {:?}", e);
                return Err(e.into_download_error(index));
            }
        };
        buffer.insert(index, payload);

        while let Some((written_index, payload)) = buffer.pop_next() {
            sink.write_all(&payload)?;
            let written = buffer.next_expected() - start;
            tracing::debug!(index = written_index, written, total = count, "segment written");
            if let Some(tx) = progress {
                let _ = tx.send(SegmentProgress { written, total: count });
            }
        }
    }

    // Channel closed: every worker has exited.
    if cancel.is_cancelled() {
        return Err(DownloadError::Cancelled);
    }
    let written = buffer.next_expected() - start;
    if written != count {
        return Err(DownloadError::Incomplete {
            expected: count,
            written,
            buffered: buffer.len(),
        });
    }
    Ok(written)
}
