//! Time-weighted aggregation of a step signal into UTC calendar days.
//!
//! Each pair of consecutive samples forms an interval during which the signal
//! holds the earlier sample's value. Intervals are split at UTC midnights so
//! every millisecond is attributed to exactly one day.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tempdwell_core::models::{AnalysisResult, DailyStats, PeriodSummary, Sample, ThresholdMode};
use tempdwell_core::time_utils::{day_key, next_utc_midnight};
use tracing::debug;

// ── IntervalAggregator ────────────────────────────────────────────────────────

/// Computes overall and per-day time-weighted statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalAggregator {
    threshold: f64,
    mode: ThresholdMode,
}

impl IntervalAggregator {
    /// Aggregator using the strict `value < threshold` predicate.
    pub fn new(threshold: f64) -> Self {
        Self::with_mode(threshold, ThresholdMode::Strict)
    }

    pub fn with_mode(threshold: f64, mode: ThresholdMode) -> Self {
        Self { threshold, mode }
    }

    /// Aggregate `samples`, which should be sorted by strictly increasing
    /// timestamp.
    ///
    /// Intervals with a non-positive duration are skipped and counted in
    /// [`AnalysisResult::intervals_skipped`]. Fewer than two samples yield an
    /// empty result with an overall average of `0.0`.
    pub fn aggregate(&self, samples: &[Sample]) -> AnalysisResult {
        let mut result = AnalysisResult::empty(self.threshold, self.mode);
        let mut weighted_sum = 0.0_f64;

        for pair in samples.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            let duration_ms = (next.timestamp - current.timestamp).num_milliseconds();
            if duration_ms <= 0 {
                debug!(
                    "Skipping interval {} -> {} ({} ms)",
                    current.timestamp, next.timestamp, duration_ms
                );
                result.intervals_skipped += 1;
                continue;
            }

            result.total_duration_ms += duration_ms;
            weighted_sum += duration_ms as f64 * current.value;
            result.intervals_processed += 1;

            self.split_by_day(
                current.timestamp,
                next.timestamp,
                current.value,
                &mut result.daily_stats,
            );
        }

        if result.total_duration_ms > 0 {
            result.overall_average = weighted_sum / result.total_duration_ms as f64;
        }

        debug!(
            "Aggregated {} intervals over {} days ({} skipped)",
            result.intervals_processed,
            result.daily_stats.len(),
            result.intervals_skipped
        );

        result
    }

    /// Below-threshold figures across all days of `result`.
    ///
    /// Every observed day counts toward the average, including days with no
    /// time below the threshold. `max_below_day` is the earliest day reaching
    /// the maximum, or `None` when no time was spent below the threshold.
    pub fn summarize(result: &AnalysisResult) -> PeriodSummary {
        let days = result.daily_stats.len();
        if days == 0 {
            return PeriodSummary::default();
        }

        let mut total_below_ms = 0i64;
        let mut max_daily_below_ms = 0i64;
        let mut max_below_day = None;
        for (key, day) in &result.daily_stats {
            total_below_ms += day.time_below_threshold_ms;
            if day.time_below_threshold_ms > max_daily_below_ms {
                max_daily_below_ms = day.time_below_threshold_ms;
                max_below_day = Some(key.clone());
            }
        }

        PeriodSummary {
            days,
            average_daily_below_ms: total_below_ms as f64 / days as f64,
            max_daily_below_ms,
            max_below_day,
        }
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// Attribute `[start, end)` at `value` to the UTC days it covers.
    fn split_by_day(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        value: f64,
        daily: &mut BTreeMap<String, DailyStats>,
    ) {
        let below = self.mode.is_below(value, self.threshold);
        let mut cursor = start;

        // The boundary is strictly after the cursor, so each pass advances it.
        while cursor < end {
            let segment_end = match next_utc_midnight(cursor) {
                Some(midnight) if midnight < end => midnight,
                _ => end,
            };

            let segment_ms = (segment_end - cursor).num_milliseconds();
            if segment_ms > 0 {
                let key = day_key(cursor);
                daily
                    .entry(key.clone())
                    .or_insert_with(|| DailyStats::new(key))
                    .add_segment(segment_ms, value, below);
            }

            cursor = segment_end;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempdwell_core::models::SampleSeries;
    use tempdwell_core::time_utils::MS_PER_DAY;

    const HOUR_MS: i64 = 3_600_000;

    fn sample(value: f64, ts: &str) -> Sample {
        Sample::new(
            value,
            DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc),
        )
    }

    /// Five readings covering exactly 2023-01-01.
    fn one_day() -> Vec<Sample> {
        vec![
            sample(10.0, "2023-01-01T00:00:00Z"),
            sample(-5.0, "2023-01-01T06:00:00Z"),
            sample(0.0, "2023-01-01T12:00:00Z"),
            sample(5.0, "2023-01-01T18:00:00Z"),
            sample(5.0, "2023-01-02T00:00:00Z"),
        ]
    }

    /// Deterministic irregular series spanning several days.
    fn irregular_series() -> SampleSeries {
        let base = Utc.with_ymd_and_hms(2023, 3, 10, 17, 23, 11).unwrap();
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut offset_ms = 0i64;
        let mut samples = Vec::new();
        for _ in 0..200 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            offset_ms += 1 + (state % (7 * HOUR_MS as u64)) as i64;
            let value = (state % 400) as f64 / 10.0 - 20.0;
            samples.push(Sample::new(
                value,
                base + chrono::Duration::milliseconds(offset_ms),
            ));
        }
        SampleSeries::from_samples(samples)
    }

    // ── aggregate: scenarios ──────────────────────────────────────────────────

    #[test]
    fn test_single_day_scenario() {
        let result = IntervalAggregator::new(0.0).aggregate(&one_day());

        assert_eq!(result.daily_stats.len(), 1);
        let day = result.day("2023-01-01").expect("stats for 2023-01-01");
        assert_eq!(day.total_duration_ms, 24 * HOUR_MS);
        // Only the -5 interval; 0 is not below 0.
        assert_eq!(day.time_below_threshold_ms, 6 * HOUR_MS);
        assert_eq!(day.time_at_or_above_threshold_ms(), 18 * HOUR_MS);
        assert!((day.average_value() - 40.0 / 24.0).abs() < 1e-9);
        assert!((result.overall_average - 40.0 / 24.0).abs() < 1e-9);
        assert_eq!(result.intervals_processed, 4);
        assert_eq!(result.intervals_skipped, 0);
    }

    #[test]
    fn test_inclusive_mode_counts_equal_value() {
        let result =
            IntervalAggregator::with_mode(0.0, ThresholdMode::Inclusive).aggregate(&one_day());
        let day = result.day("2023-01-01").unwrap();
        assert_eq!(day.time_below_threshold_ms, 12 * HOUR_MS);
        assert_eq!(result.threshold_mode, ThresholdMode::Inclusive);
    }

    #[test]
    fn test_value_equal_to_threshold_is_not_below() {
        let samples = vec![
            sample(2.5, "2023-01-01T00:00:00Z"),
            sample(1.0, "2023-01-01T10:00:00Z"),
        ];
        let result = IntervalAggregator::new(2.5).aggregate(&samples);
        assert_eq!(result.day("2023-01-01").unwrap().time_below_threshold_ms, 0);
    }

    #[test]
    fn test_interval_spanning_36_hours_splits_into_three_days() {
        let samples = vec![
            sample(-2.0, "2023-01-01T18:00:00Z"),
            sample(4.0, "2023-01-03T06:00:00Z"),
        ];
        let result = IntervalAggregator::new(0.0).aggregate(&samples);

        let keys: Vec<&str> = result.daily_stats.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["2023-01-01", "2023-01-02", "2023-01-03"]);

        let durations: Vec<i64> = result
            .daily_stats
            .values()
            .map(|d| d.total_duration_ms)
            .collect();
        assert_eq!(durations, vec![6 * HOUR_MS, 24 * HOUR_MS, 6 * HOUR_MS]);
        assert_eq!(durations.iter().sum::<i64>(), 36 * HOUR_MS);

        for day in result.daily_stats.values() {
            assert!((day.weighted_value_sum - -2.0 * day.total_duration_ms as f64).abs() < 1e-6);
            assert_eq!(day.time_below_threshold_ms, day.total_duration_ms);
            assert!((day.average_value() - -2.0).abs() < 1e-9);
        }
        assert_eq!(result.total_duration_ms, 36 * HOUR_MS);
    }

    #[test]
    fn test_interval_ending_exactly_at_midnight_stays_in_one_day() {
        let samples = vec![
            sample(1.0, "2023-01-01T20:00:00Z"),
            sample(1.0, "2023-01-02T00:00:00Z"),
        ];
        let result = IntervalAggregator::new(0.0).aggregate(&samples);
        assert_eq!(result.daily_stats.len(), 1);
        assert_eq!(result.day("2023-01-01").unwrap().total_duration_ms, 4 * HOUR_MS);
    }

    #[test]
    fn test_millisecond_precision_across_midnight() {
        let samples = vec![
            sample(3.0, "2023-01-01T23:59:59.750Z"),
            sample(3.0, "2023-01-02T00:00:00.500Z"),
        ];
        let result = IntervalAggregator::new(0.0).aggregate(&samples);
        assert_eq!(result.day("2023-01-01").unwrap().total_duration_ms, 250);
        assert_eq!(result.day("2023-01-02").unwrap().total_duration_ms, 500);
    }

    // ── aggregate: degenerate input ───────────────────────────────────────────

    #[test]
    fn test_empty_and_single_sample_yield_zero_result() {
        let aggregator = IntervalAggregator::new(0.0);

        let empty = aggregator.aggregate(&[]);
        assert_eq!(empty.overall_average, 0.0);
        assert!(empty.daily_stats.is_empty());

        let single = aggregator.aggregate(&[sample(7.0, "2023-01-01T00:00:00Z")]);
        assert_eq!(single.overall_average, 0.0);
        assert!(single.daily_stats.is_empty());
        assert_eq!(single.intervals_processed, 0);
    }

    #[test]
    fn test_non_positive_intervals_are_skipped() {
        let samples = vec![
            sample(1.0, "2023-01-01T00:00:00Z"),
            sample(2.0, "2023-01-01T06:00:00Z"),
            sample(3.0, "2023-01-01T06:00:00Z"),
            sample(4.0, "2023-01-01T03:00:00Z"),
        ];
        let result = IntervalAggregator::new(0.0).aggregate(&samples);

        assert_eq!(result.intervals_processed, 1);
        assert_eq!(result.intervals_skipped, 2);
        assert_eq!(result.total_duration_ms, 6 * HOUR_MS);
        assert!((result.overall_average - 1.0).abs() < 1e-9);
    }

    // ── aggregate: invariants ─────────────────────────────────────────────────

    #[test]
    fn test_daily_durations_sum_to_covered_span() {
        let series = irregular_series();
        let result = IntervalAggregator::new(0.0).aggregate(series.as_slice());

        let span = (series.last().unwrap().timestamp - series.first().unwrap().timestamp)
            .num_milliseconds();
        let daily_total: i64 = result.daily_stats.values().map(|d| d.total_duration_ms).sum();

        assert_eq!(result.intervals_skipped, 0);
        assert_eq!(result.total_duration_ms, span);
        assert_eq!(daily_total, span);
    }

    #[test]
    fn test_interior_days_are_exactly_full() {
        let series = irregular_series();
        let result = IntervalAggregator::new(0.0).aggregate(series.as_slice());
        assert!(result.daily_stats.len() > 2);

        let first = day_key(series.first().unwrap().timestamp);
        let last = day_key(series.last().unwrap().timestamp);
        for (key, day) in &result.daily_stats {
            assert!(day.total_duration_ms <= MS_PER_DAY, "{key} over-full");
            assert!(day.time_below_threshold_ms <= day.total_duration_ms);
            if *key != first && *key != last {
                assert_eq!(day.total_duration_ms, MS_PER_DAY, "{key} not full");
            }
        }
    }

    #[test]
    fn test_overall_average_matches_duration_weighted_mean() {
        let series = irregular_series();
        let samples = series.as_slice();
        let result = IntervalAggregator::new(0.0).aggregate(samples);

        let mut weighted = 0.0;
        let mut total = 0.0;
        for pair in samples.windows(2) {
            let d = (pair[1].timestamp - pair[0].timestamp).num_milliseconds() as f64;
            weighted += d * pair[0].value;
            total += d;
        }
        assert!((result.overall_average - weighted / total).abs() < 1e-9);

        let daily_weighted: f64 = result.daily_stats.values().map(|d| d.weighted_value_sum).sum();
        assert!((daily_weighted - weighted).abs() / weighted.abs().max(1.0) < 1e-9);
    }

    // ── summarize ─────────────────────────────────────────────────────────────

    #[test]
    fn test_summarize_average_and_max() {
        let samples = vec![
            sample(-1.0, "2023-01-01T00:00:00Z"),
            sample(3.0, "2023-01-01T02:00:00Z"),
            sample(-1.0, "2023-01-02T00:00:00Z"),
            sample(3.0, "2023-01-02T06:00:00Z"),
            sample(3.0, "2023-01-03T12:00:00Z"),
        ];
        let result = IntervalAggregator::new(0.0).aggregate(&samples);
        let summary = IntervalAggregator::summarize(&result);

        assert_eq!(summary.days, 3);
        assert_eq!(summary.max_daily_below_ms, 6 * HOUR_MS);
        assert_eq!(summary.max_below_day.as_deref(), Some("2023-01-02"));
        // (2h + 6h + 0h) / 3 days.
        assert!((summary.average_daily_below_ms - (8 * HOUR_MS) as f64 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_summarize_tie_keeps_earliest_day() {
        let samples = vec![
            sample(-1.0, "2023-01-01T00:00:00Z"),
            sample(3.0, "2023-01-01T04:00:00Z"),
            sample(-1.0, "2023-01-02T00:00:00Z"),
            sample(3.0, "2023-01-02T04:00:00Z"),
        ];
        let result = IntervalAggregator::new(0.0).aggregate(&samples);
        let summary = IntervalAggregator::summarize(&result);
        assert_eq!(summary.max_below_day.as_deref(), Some("2023-01-01"));
    }

    #[test]
    fn test_summarize_without_time_below() {
        let result = IntervalAggregator::new(-100.0).aggregate(&one_day());
        let summary = IntervalAggregator::summarize(&result);
        assert_eq!(summary.days, 1);
        assert_eq!(summary.max_daily_below_ms, 0);
        assert!(summary.max_below_day.is_none());
        assert_eq!(summary.average_daily_below_ms, 0.0);
    }

    #[test]
    fn test_summarize_empty_result() {
        let result = IntervalAggregator::new(0.0).aggregate(&[]);
        assert_eq!(IntervalAggregator::summarize(&result), PeriodSummary::default());
    }
}
