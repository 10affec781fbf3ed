//! Minimal MPEG-DASH MPD structures (single period, number-based templates).

use serde::Deserialize;

use crate::model::SegmentTemplate;

/// Root `<MPD>` element.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Mpd {
    /// ISO 8601 duration, e.g. `PT5M59.7S`.
    #[serde(rename = "@mediaPresentationDuration", default)]
    pub media_presentation_duration: String,
    #[serde(rename = "@minBufferTime", default)]
    pub min_buffer_time: String,
    #[serde(rename = "ProgramInformation", default)]
    pub program_information: Option<ProgramInformation>,
    #[serde(rename = "Period", default)]
    pub period: Period,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgramInformation {
    #[serde(rename = "Title", default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Period {
    #[serde(rename = "AdaptationSet", default)]
    pub adaptation_sets: Vec<AdaptationSet>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdaptationSet {
    #[serde(rename = "@id", default)]
    pub id: u64,
    #[serde(rename = "@mimeType", default)]
    pub mime_type: String,
    /// Template shared by representations that do not carry their own.
    #[serde(rename = "SegmentTemplate", default)]
    pub segment_template: Option<SegmentTemplate>,
    #[serde(rename = "Representation", default)]
    pub representations: Vec<Representation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Representation {
    #[serde(rename = "@id", default)]
    pub id: String,
    #[serde(rename = "@bandwidth", default)]
    pub bandwidth: u64,
    #[serde(rename = "@codecs", default)]
    pub codecs: String,
    #[serde(rename = "@width", default)]
    pub width: u32,
    #[serde(rename = "@height", default)]
    pub height: u32,
    #[serde(rename = "SegmentTemplate", default)]
    pub segment_template: Option<SegmentTemplate>,
}

impl Mpd {
    /// Non-empty program title, if the manifest has one.
    pub fn title(&self) -> Option<&str> {
        self.program_information
            .as_ref()
            .map(|p| p.title.trim())
            .filter(|t| !t.is_empty())
    }
}
