use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single sensor reading: the signal holds `value` from `timestamp` until
/// the next reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Numeric state reported by the sensor.
    pub value: f64,
    /// UTC instant of the reading, millisecond resolution.
    pub timestamp: DateTime<Utc>,
}

impl Sample {
    /// Build a sample, truncating `timestamp` to whole milliseconds.
    pub fn new(value: f64, timestamp: DateTime<Utc>) -> Self {
        let timestamp = DateTime::from_timestamp_millis(timestamp.timestamp_millis())
            .unwrap_or(timestamp);
        Self { value, timestamp }
    }

    /// Deduplication key: milliseconds since the Unix epoch.
    pub fn key(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

/// Samples ordered by strictly increasing timestamp, no two sharing one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SampleSeries {
    samples: Vec<Sample>,
}

impl SampleSeries {
    /// Build a series from samples in any order.
    ///
    /// When several samples share a timestamp, the one yielded last wins.
    pub fn from_samples(samples: impl IntoIterator<Item = Sample>) -> Self {
        let mut by_key: BTreeMap<i64, Sample> = BTreeMap::new();
        for sample in samples {
            by_key.insert(sample.key(), sample);
        }
        Self {
            samples: by_key.into_values().collect(),
        }
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }
}

/// How a value is compared against the threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMode {
    /// `value < threshold`.
    #[default]
    Strict,
    /// `value <= threshold`. Only used when explicitly requested.
    Inclusive,
}

impl ThresholdMode {
    /// Whether `value` counts as below `threshold` under this mode.
    pub fn is_below(self, value: f64, threshold: f64) -> bool {
        match self {
            ThresholdMode::Strict => value < threshold,
            ThresholdMode::Inclusive => value <= threshold,
        }
    }
}

/// Time-weighted statistics for one UTC calendar day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    /// Day key, `YYYY-MM-DD`.
    pub date: String,
    /// Milliseconds of signal attributed to this day.
    pub total_duration_ms: i64,
    /// Σ value × duration (ms) over this day's segments.
    pub weighted_value_sum: f64,
    /// Milliseconds during which the value was below the threshold.
    pub time_below_threshold_ms: i64,
}

impl DailyStats {
    pub fn new(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            ..Self::default()
        }
    }

    /// Accumulate one constant-value segment.
    pub fn add_segment(&mut self, duration_ms: i64, value: f64, below_threshold: bool) {
        self.total_duration_ms += duration_ms;
        self.weighted_value_sum += duration_ms as f64 * value;
        if below_threshold {
            self.time_below_threshold_ms += duration_ms;
        }
    }

    /// Time-weighted average value for the day, `0.0` with no coverage.
    pub fn average_value(&self) -> f64 {
        if self.total_duration_ms > 0 {
            self.weighted_value_sum / self.total_duration_ms as f64
        } else {
            0.0
        }
    }

    /// Observed time not below the threshold.
    pub fn time_at_or_above_threshold_ms(&self) -> i64 {
        self.total_duration_ms - self.time_below_threshold_ms
    }
}

/// Output of one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Duration-weighted mean over all intervals; `0.0` when there are none.
    pub overall_average: f64,
    /// Threshold the daily below-threshold times were computed against.
    pub threshold: f64,
    pub threshold_mode: ThresholdMode,
    /// Sum of all interval durations.
    pub total_duration_ms: i64,
    /// Intervals that contributed to the statistics.
    pub intervals_processed: usize,
    /// Intervals dropped for having a non-positive duration.
    pub intervals_skipped: usize,
    /// Per-day statistics keyed by `YYYY-MM-DD`, in date order.
    pub daily_stats: BTreeMap<String, DailyStats>,
}

impl AnalysisResult {
    /// An empty result for the given threshold.
    pub fn empty(threshold: f64, threshold_mode: ThresholdMode) -> Self {
        Self {
            overall_average: 0.0,
            threshold,
            threshold_mode,
            total_duration_ms: 0,
            intervals_processed: 0,
            intervals_skipped: 0,
            daily_stats: BTreeMap::new(),
        }
    }

    pub fn day(&self, key: &str) -> Option<&DailyStats> {
        self.daily_stats.get(key)
    }
}

/// Below-threshold figures across every day of an [`AnalysisResult`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// Number of days with any coverage.
    pub days: usize,
    /// Mean of the per-day below-threshold times.
    pub average_daily_below_ms: f64,
    /// Largest single-day below-threshold time.
    pub max_daily_below_ms: i64,
    /// Day on which `max_daily_below_ms` occurred (earliest on ties).
    pub max_below_day: Option<String>,
}
