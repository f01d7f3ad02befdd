use crate::time_utils::{ms_to_minutes, MINUTES_PER_DAY};

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use tempdwell_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 1), "1,234.5");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-3.456, 2), "-3.46");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let formatted = format!("{:.prec$}", value.abs(), prec = decimals as usize);
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let mut result = group_thousands(int_part);
    if let Some(frac) = frac_part {
        result.push('.');
        result.push_str(frac);
    }

    // Values that round to zero lose their sign.
    let is_zero = formatted.chars().all(|c| c == '0' || c == '.');
    if value < 0.0 && !is_zero {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a millisecond duration as a human-readable string.
///
/// * under an hour → `"45m"`
/// * whole hours → `"3h"`
/// * otherwise → `"3h 45m"`
///
/// # Examples
///
/// ```
/// use tempdwell_core::formatting::format_duration;
///
/// assert_eq!(format_duration(45 * 60_000), "45m");
/// assert_eq!(format_duration(6 * 3_600_000), "6h");
/// assert_eq!(format_duration(225 * 60_000), "3h 45m");
/// ```
pub fn format_duration(ms: i64) -> String {
    let total_mins = ms_to_minutes(ms as f64).round() as i64;
    if total_mins < 60 {
        return format!("{}m", total_mins);
    }
    let hours = total_mins / 60;
    let mins = total_mins % 60;
    if mins == 0 {
        format!("{}h", hours)
    } else {
        format!("{}h {}m", hours, mins)
    }
}

/// Calculate `(part / whole) * 100`, rounded to `decimal_places`.
///
/// Returns `0.0` if `whole` is zero.
pub fn percentage(part: f64, whole: f64, decimal_places: u32) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    let raw = (part / whole) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    (raw * factor).round() / factor
}

/// Share of a full UTC day (1440 minutes) covered by `ms`, in percent.
pub fn percent_of_day(ms: i64, decimal_places: u32) -> f64 {
    percentage(ms_to_minutes(ms as f64), MINUTES_PER_DAY, decimal_places)
}

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let lead = s.len() % 3;
    for (i, c) in s.chars().enumerate() {
        if i != 0 && i % 3 == lead {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── format_number ────────────────────────────────────────────────────────

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_with_thousands() {
        assert_eq!(format_number(1_234.5, 1), "1,234.5");
        assert_eq!(format_number(1_234_567.0, 0), "1,234,567");
    }

    #[test]
    fn test_format_number_negative() {
        assert_eq!(format_number(-9_876.5, 1), "-9,876.5");
        assert_eq!(format_number(-5.0, 2), "-5.00");
    }

    #[test]
    fn test_format_number_negative_rounding_to_zero_drops_sign() {
        assert_eq!(format_number(-0.001, 2), "0.00");
    }

    // ── format_duration ──────────────────────────────────────────────────────

    #[test]
    fn test_format_duration_zero() {
        assert_eq!(format_duration(0), "0m");
    }

    #[test]
    fn test_format_duration_exact_hours() {
        assert_eq!(format_duration(60 * 60_000), "1h");
        assert_eq!(format_duration(24 * 60 * 60_000), "24h");
    }

    #[test]
    fn test_format_duration_rounds_to_minute() {
        assert_eq!(format_duration(90_000), "2m");
        assert_eq!(format_duration(61 * 60_000 + 10_000), "1h 1m");
    }

    // ── percentage / percent_of_day ──────────────────────────────────────────

    #[test]
    fn test_percentage_zero_whole() {
        assert_eq!(percentage(10.0, 0.0, 2), 0.0);
    }

    #[test]
    fn test_percentage_rounding() {
        let p = percentage(1.0, 3.0, 2);
        assert!((p - 33.33).abs() < 1e-9, "percentage = {p}");
    }

    #[test]
    fn test_percent_of_day_quarter() {
        assert!((percent_of_day(6 * 3_600_000, 2) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_of_day_full() {
        assert!((percent_of_day(86_400_000, 2) - 100.0).abs() < 1e-9);
    }
}
