//! Fetch error type.

/// Failure of a single GET (segment, initialization segment or manifest).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-2xx status.
    #[error("GET {url} returned HTTP {code}")]
    Status { url: String, code: u32 },
    /// DNS, connect, timeout, read failure, or a transfer aborted by cancellation.
    #[error("GET {url} failed")]
    Transport {
        url: String,
        #[source]
        source: curl::Error,
    },
}

impl FetchError {
    pub(super) fn transport(url: &str, source: curl::Error) -> Self {
        FetchError::Transport {
            url: url.to_string(),
            source,
        }
    }

    /// HTTP status for `Status` errors.
    pub fn status(&self) -> Option<u32> {
        match self {
            FetchError::Status { code, .. } => Some(*code),
            FetchError::Transport { .. } => None,
        }
    }

    /// True when the transfer was stopped by the cancel token.
    pub fn is_aborted(&self) -> bool {
        match self {
            FetchError::Transport { source, .. } => source.is_aborted_by_callback(),
            FetchError::Status { .. } => false,
        }
    }
}
