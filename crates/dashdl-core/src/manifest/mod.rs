//! DASH manifest (MPD) fetching, parsing and stream selection.
//!
//! Only what the downloader needs is modeled: the presentation duration, the
//! program title, and per-representation number-based segment templates.

mod duration;
mod parse;
mod select;

pub use duration::parse_presentation_duration;
pub use parse::{AdaptationSet, Mpd, Period, ProgramInformation, Representation};
pub use select::{parse_resolution, SelectedStream, AUDIO_MIME_TYPE, VIDEO_MIME_TYPE};

use crate::control::CancelToken;
use crate::fetch::{fetch, FetchError, FetchOptions};

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to fetch manifest")]
    Fetch(#[from] FetchError),
    #[error("manifest is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("failed to parse manifest XML")]
    Xml(#[from] quick_xml::de::DeError),
    #[error("invalid presentation duration {0:?}")]
    InvalidDuration(String),
    #[error("no video representation found")]
    NoVideoRepresentation,
    #[error("no audio representation found")]
    NoAudioRepresentation,
    #[error("representation {0:?} has no segment template")]
    MissingSegmentTemplate(String),
}

/// Parses an MPD document.
pub fn parse_manifest(xml: &str) -> Result<Mpd, ManifestError> {
    Ok(quick_xml::de::from_str(xml)?)
}

/// GETs and parses the manifest at `url`.
pub fn fetch_manifest(
    url: &str,
    options: &FetchOptions,
    cancel: &CancelToken,
) -> Result<Mpd, ManifestError> {
    let body = fetch(url, options, cancel)?;
    let xml = String::from_utf8(body)?;
    let mpd = parse_manifest(&xml)?;
    tracing::debug!(
        url,
        adaptation_sets = mpd.period.adaptation_sets.len(),
        duration = %mpd.media_presentation_duration,
        "parsed manifest"
    );
    Ok(mpd)
}

impl Mpd {
    /// Presentation duration in seconds.
    pub fn duration_secs(&self) -> Result<f64, ManifestError> {
        parse_presentation_duration(&self.media_presentation_duration)
    }
}
