//! Segment addressing and output naming.
//!
//! [`resolve`] turns a manifest URL plus a (possibly relative) segment path
//! into the absolute URL to fetch. It is a pure function and is called from
//! every download worker concurrently.

mod manifest_url;
mod sanitize;

pub use manifest_url::manifest_url_from_input;
pub use sanitize::sanitize_title;

use url::Url;

/// Filename the CLI uses when the user does not pick one.
pub const DEFAULT_OUTPUT_FILENAME: &str = "output.mp4";

/// A manifest URL or segment path that cannot be used as a URL reference.
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("URL contains a control character: {0:?}")]
    ControlCharacter(String),
    #[error("invalid URL: {input:?}")]
    Invalid {
        input: String,
        #[source]
        source: url::ParseError,
    },
}

/// Resolves `reference` against `base` using standard relative-reference rules.
///
/// `..` walks up the base path, an absolute path replaces it, and a reference
/// carrying its own query string replaces the base query. An absolute
/// reference ignores `base` entirely.
///
/// # Examples
///
/// - `resolve("https://example.com/video/manifest/video.mpd", "../../seg.mp4")` → `"https://example.com/seg.mp4"`
/// - `resolve("https://example.com/m.mpd?token=1", "seg.mp4?q=2")` → `"https://example.com/seg.mp4?q=2"`
pub fn resolve(base: &str, reference: &str) -> Result<String, AddressError> {
    // The WHATWG parser silently strips tabs and newlines; treat any control
    // character as malformed input instead.
    reject_control_characters(base)?;
    reject_control_characters(reference)?;

    let base_url = Url::parse(base).map_err(|source| AddressError::Invalid {
        input: base.to_string(),
        source,
    })?;
    let resolved = base_url
        .join(reference)
        .map_err(|source| AddressError::Invalid {
            input: reference.to_string(),
            source,
        })?;
    Ok(resolved.into())
}

fn reject_control_characters(input: &str) -> Result<(), AddressError> {
    if input.chars().any(|c| c.is_control()) {
        return Err(AddressError::ControlCharacter(input.to_string()));
    }
    Ok(())
}

/// Picks the final output filename.
///
/// A user-chosen name always wins. With the default name, a non-empty
/// manifest title is sanitized and used instead.
pub fn output_filename(requested: &str, title: Option<&str>) -> String {
    if requested != DEFAULT_OUTPUT_FILENAME {
        return requested.to_string();
    }
    match title.map(sanitize_title) {
        Some(safe) if !safe.is_empty() => format!("{safe}.mp4"),
        _ => requested.to_string(),
    }
}
