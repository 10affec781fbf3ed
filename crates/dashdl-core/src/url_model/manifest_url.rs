//! Manifest URL derivation from user input.

const MANIFEST_SUFFIX: &str = "/manifest/video.mpd";

/// Turns a player URL into the DASH manifest URL.
///
/// `…/iframe` is replaced by `…/manifest/video.mpd`, a URL already ending in
/// `.mpd` is kept, anything else gets the manifest path appended.
pub fn manifest_url_from_input(input: &str) -> String {
    if let Some(stem) = input.strip_suffix("/iframe") {
        return format!("{stem}{MANIFEST_SUFFIX}");
    }
    if input.ends_with(".mpd") {
        return input.to_string();
    }
    format!("{input}{MANIFEST_SUFFIX}")
}
