//! Representation selection by media type and target height.

use crate::model::StreamDescriptor;

use super::parse::{AdaptationSet, Mpd, Representation};
use super::ManifestError;

pub const VIDEO_MIME_TYPE: &str = "video/mp4";
pub const AUDIO_MIME_TYPE: &str = "audio/mp4";

/// A chosen representation together with the adaptation set it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct SelectedStream<'a> {
    pub adaptation_set: &'a AdaptationSet,
    pub representation: &'a Representation,
}

impl SelectedStream<'_> {
    /// Builds the downloader input. The representation's own template wins
    /// over the adaptation set's.
    pub fn descriptor(&self) -> Result<StreamDescriptor, ManifestError> {
        let rep = self.representation;
        let template = rep
            .segment_template
            .as_ref()
            .or(self.adaptation_set.segment_template.as_ref())
            .ok_or_else(|| ManifestError::MissingSegmentTemplate(rep.id.clone()))?;
        Ok(StreamDescriptor {
            id: rep.id.clone(),
            bandwidth: rep.bandwidth,
            template: template.clone(),
        })
    }
}

impl Mpd {
    fn adaptation_sets(&self, mime_type: &'static str) -> impl Iterator<Item = &AdaptationSet> {
        self.period
            .adaptation_sets
            .iter()
            .filter(move |set| set.mime_type == mime_type)
    }

    /// Video representation whose height is closest to `target_height`.
    /// On a tie the first one in document order wins.
    pub fn select_video(&self, target_height: u32) -> Result<SelectedStream<'_>, ManifestError> {
        let mut best: Option<(u32, SelectedStream<'_>)> = None;
        for set in self.adaptation_sets(VIDEO_MIME_TYPE) {
            for rep in &set.representations {
                let diff = rep.height.abs_diff(target_height);
                if best.as_ref().map_or(true, |(d, _)| diff < *d) {
                    best = Some((
                        diff,
                        SelectedStream {
                            adaptation_set: set,
                            representation: rep,
                        },
                    ));
                }
            }
        }
        best.map(|(_, s)| s)
            .ok_or(ManifestError::NoVideoRepresentation)
    }

    /// First representation of the first audio adaptation set that has one.
    pub fn select_audio(&self) -> Result<SelectedStream<'_>, ManifestError> {
        self.adaptation_sets(AUDIO_MIME_TYPE)
            .find_map(|set| {
                set.representations.first().map(|rep| SelectedStream {
                    adaptation_set: set,
                    representation: rep,
                })
            })
            .ok_or(ManifestError::NoAudioRepresentation)
    }
}

/// Parses `"720p"` / `"720"` into a height; anything else means 1080.
pub fn parse_resolution(value: &str) -> u32 {
    const DEFAULT_HEIGHT: u32 = 1080;
    let lower = value.trim().to_ascii_lowercase();
    lower
        .strip_suffix('p')
        .unwrap_or(&lower)
        .parse()
        .unwrap_or(DEFAULT_HEIGHT)
}
