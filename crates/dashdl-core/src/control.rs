//! Cancellation for stream downloads: a shared abort token.
//!
//! One token is created per CLI invocation (wired to Ctrl-C) and passed by
//! reference into every download. The orchestrator derives a child token for
//! its worker pool so it can stop the pool on a segment failure without
//! cancelling the caller's token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Error returned when a download is stopped through its cancel token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("download cancelled")]
pub struct Cancelled;

/// Cheap, clonable cancellation flag. Clones share the same state.
///
/// A token created with [`CancelToken::child`] reports cancelled when either
/// it or any ancestor is cancelled; cancelling the child leaves the parent
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    parent: Option<Box<CancelToken>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || self.parent.as_ref().is_some_and(|p| p.is_cancelled())
    }

    /// Token that observes this one but can be cancelled on its own.
    pub fn child(&self) -> CancelToken {
        CancelToken {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Box::new(self.clone())),
        }
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
