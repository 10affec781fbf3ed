//! ISO 8601 duration parsing for `mediaPresentationDuration`.

use super::ManifestError;

/// Parses `P[nD][T[nH][nM][n[.n]S]]` into seconds.
///
/// Year and month designators are rejected: their length in seconds is not
/// fixed and DASH presentations do not use them.
pub fn parse_presentation_duration(value: &str) -> Result<f64, ManifestError> {
    let invalid = || ManifestError::InvalidDuration(value.to_string());

    let rest = value.trim().strip_prefix('P').ok_or_else(invalid)?;
    let (date, time) = match rest.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (rest, None),
    };
    if date.is_empty() && time.map_or(true, str::is_empty) {
        return Err(invalid());
    }

    let mut secs = 0.0;
    for (amount, unit) in components(date).ok_or_else(invalid)? {
        match unit {
            'D' => secs += amount * 86_400.0,
            _ => return Err(invalid()),
        }
    }
    if let Some(time) = time {
        for (amount, unit) in components(time).ok_or_else(invalid)? {
            secs += match unit {
                'H' => amount * 3_600.0,
                'M' => amount * 60.0,
                'S' => amount,
                _ => return Err(invalid()),
            };
        }
    }
    Ok(secs)
}

/// Splits `1H2M3.5S` into `[(1, 'H'), (2, 'M'), (3.5, 'S')]`.
fn components(s: &str) -> Option<Vec<(f64, char)>> {
    let mut out = Vec::new();
    let mut number = String::new();
    for c in s.chars() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
        } else {
            let amount: f64 = number.parse().ok()?;
            out.push((amount, c.to_ascii_uppercase()));
            number.clear();
        }
    }
    // Trailing digits without a designator.
    if !number.is_empty() {
        return None;
    }
    Some(out)
}
