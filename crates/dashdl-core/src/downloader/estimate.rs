//! Segment count estimation from the presentation duration.

/// Number of media segments to request for a stream.
///
/// `floor(total / segment)`, plus one extra segment to absorb rounding and a
/// short trailing segment. Returns `Some(0)` when either duration is not a
/// positive finite number: without a usable segment duration there is nothing
/// to number, and the stream is the initialization segment alone.
///
/// Returns `None` when the count does not fit in a `u64`, e.g. a template with
/// a huge timescale and a tiny duration.
pub fn estimate_segment_count(total_duration_secs: f64, segment_duration_secs: f64) -> Option<u64> {
    let usable = |v: f64| v.is_finite() && v > 0.0;
    if !usable(total_duration_secs) || !usable(segment_duration_secs) {
        return Some(0);
    }
    let whole = (total_duration_secs / segment_duration_secs).floor();
    // 2^64 is exact in f64; anything below it converts without saturating.
    if whole >= u64::MAX as f64 {
        return None;
    }
    (whole as u64).checked_add(1)
}
