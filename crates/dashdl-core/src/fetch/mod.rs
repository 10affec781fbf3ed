//! Single-request HTTP GET over libcurl.
//!
//! Used for the initialization segment, every media segment and the
//! manifest. Reads the whole body into memory; segments are a few MB at most.
//! No retries.

mod error;

pub use error::FetchError;

use crate::control::CancelToken;
use std::time::Duration;

/// Transfer settings shared by all requests of one download.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub connect_timeout: Duration,
    /// Hard wall-clock limit for one request.
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(300),
            user_agent: None,
        }
    }
}

/// GETs `url` and returns the full body.
///
/// Any non-2xx status is [`FetchError::Status`]. Transport failures, including
/// an abort because `cancel` fired mid-transfer, are [`FetchError::Transport`].
/// libcurl invokes the progress callback at least once per second, so a
/// cancelled transfer stops within about a second even when the peer is idle.
pub fn fetch(url: &str, options: &FetchOptions, cancel: &CancelToken) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();

    let mut easy = curl::easy::Easy::new();
    let err = |e| FetchError::transport(url, e);
    easy.url(url).map_err(err)?;
    easy.get(true).map_err(err)?;
    easy.follow_location(true).map_err(err)?;
    easy.max_redirections(10).map_err(err)?;
    easy.connect_timeout(options.connect_timeout).map_err(err)?;
    easy.timeout(options.timeout).map_err(err)?;
    if let Some(agent) = &options.user_agent {
        easy.useragent(agent).map_err(err)?;
    }
    easy.progress(true).map_err(err)?;

    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(err)?;
        // Returning false aborts the transfer (CURLE_ABORTED_BY_CALLBACK).
        transfer
            .progress_function(|_, _, _, _| !cancel.is_cancelled())
            .map_err(err)?;
        transfer.perform().map_err(err)?;
    }

    let code = easy.response_code().map_err(err)?;
    if !(200..300).contains(&code) {
        return Err(FetchError::Status {
            url: url.to_string(),
            code,
        });
    }

    tracing::trace!(url, bytes = body.len(), "fetched");
    Ok(body)
}
