//! ISO-8601 `PT#H#M#S` durations as returned by the video platform.

use std::time::Duration;

/// Parses a `PT#H#M#S` duration (days as `P#DT...` are accepted too).
///
/// Returns `None` for anything that is not a well-formed duration, including
/// the empty `PT` form.
#[must_use]
pub fn parse_iso8601(raw: &str) -> Option<Duration> {
    let rest = raw.strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, Some(t)),
        None => (rest, None),
    };

    let mut secs: u64 = 0;
    let mut seen = false;

    for (value, unit) in components(date_part)? {
        let factor = match unit {
            'D' => 86_400,
            'W' => 604_800,
            _ => return None,
        };
        secs = secs.checked_add(value.checked_mul(factor)?)?;
        seen = true;
    }

    if let Some(time) = time_part {
        for (value, unit) in components(time)? {
            let factor = match unit {
                'H' => 3_600,
                'M' => 60,
                'S' => 1,
                _ => return None,
            };
            secs = secs.checked_add(value.checked_mul(factor)?)?;
            seen = true;
        }
    }

    seen.then(|| Duration::from_secs(secs))
}

fn components(part: &str) -> Option<Vec<(u64, char)>> {
    let mut out = Vec::new();
    let mut digits = String::new();
    for ch in part.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else {
            if digits.is_empty() {
                return None;
            }
            out.push((digits.parse().ok()?, ch));
            digits.clear();
        }
    }
    digits.is_empty().then_some(out)
}

/// Formats a duration as a clock string: `"3:45"` or `"1:02:03"`.
#[must_use]
pub fn format_clock(duration: Duration) -> String {
    let total = duration.as_secs();
    let (h, m, s) = (total / 3_600, (total % 3_600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
