use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

/// Milliseconds in one minute.
pub const MS_PER_MINUTE: i64 = 60_000;

/// Milliseconds in one UTC calendar day.
pub const MS_PER_DAY: i64 = 86_400_000;

/// Minutes in one UTC calendar day, the denominator for daily percentages.
pub const MINUTES_PER_DAY: f64 = 1440.0;

/// Naive layouts accepted after RFC 3339 fails; interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Offset-carrying layouts with a space separator.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse an ISO 8601-like timestamp string into a UTC [`DateTime`].
///
/// Accepts RFC 3339 (`Z` suffix or any fixed offset), the same with a space
/// separator, naive date-times (taken as UTC) and bare dates (UTC midnight).
/// Returns `None` for empty strings or unrecognised formats.
pub fn parse_utc_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    // Normalise a lowercase 'z' suffix, which RFC 3339 permits.
    let normalised = match s.strip_suffix('z') {
        Some(stripped) => format!("{}Z", stripped),
        None => s.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalised, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let naive_input = normalised.strip_suffix('Z').unwrap_or(&normalised);
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(naive_input, fmt) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(naive_input, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    debug!("could not parse timestamp \"{}\"", s);
    None
}

// ── Day boundaries ────────────────────────────────────────────────────────────

/// The `YYYY-MM-DD` key of the UTC calendar day containing `dt`.
pub fn day_key(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d").to_string()
}

/// The first UTC midnight strictly after `dt`.
///
/// Returns `None` only at the upper end of chrono's representable range.
pub fn next_utc_midnight(dt: DateTime<Utc>) -> Option<DateTime<Utc>> {
    dt.date_naive()
        .succ_opt()?
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
}

/// Convert a millisecond duration to fractional minutes.
pub fn ms_to_minutes(ms: f64) -> f64 {
    ms / MS_PER_MINUTE as f64
}

// ── Tests ─────────────────────────────────────────────────────────────────────
