//! Stream and segment-template types shared by the manifest parser and the
//! downloader.

use serde::Deserialize;

/// Placeholder in a media path that is replaced by the decimal segment number.
pub const NUMBER_PLACEHOLDER: &str = "$Number$";
/// Placeholder replaced by the representation id (initialization and media paths).
pub const REPRESENTATION_ID_PLACEHOLDER: &str = "$RepresentationID$";

/// Number-based segment addressing (`<SegmentTemplate>` in an MPD).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SegmentTemplate {
    /// Path of the initialization segment, usually relative to the manifest.
    #[serde(rename = "@initialization", default)]
    pub initialization: String,
    /// Media path pattern containing [`NUMBER_PLACEHOLDER`].
    #[serde(rename = "@media", default)]
    pub media: String,
    #[serde(rename = "@startNumber", default)]
    pub start_number: u64,
    /// Segment duration in `timescale` units.
    #[serde(rename = "@duration", default)]
    pub duration: u64,
    #[serde(rename = "@timescale", default)]
    pub timescale: u64,
}

impl SegmentTemplate {
    /// Segment duration in seconds; `0.0` when the timescale is missing.
    pub fn segment_duration_secs(&self) -> f64 {
        if self.timescale == 0 {
            return 0.0;
        }
        self.duration as f64 / self.timescale as f64
    }

    /// Initialization path with the representation id substituted.
    pub fn initialization_path(&self, representation_id: &str) -> String {
        self.initialization
            .replace(REPRESENTATION_ID_PLACEHOLDER, representation_id)
    }

    /// Media path for `number`: decimal, no padding.
    pub fn media_path(&self, number: u64, representation_id: &str) -> String {
        self.media
            .replace(REPRESENTATION_ID_PLACEHOLDER, representation_id)
            .replace(NUMBER_PLACEHOLDER, &number.to_string())
    }
}

/// One encoding variant to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub id: String,
    /// Nominal bitrate in bits per second. Informational only.
    pub bandwidth: u64,
    pub template: SegmentTemplate,
}
