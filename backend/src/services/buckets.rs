//! Duration bucketing and the stacked bucket histogram.
//!
//! Buckets, by duration `d` in seconds:
//!
//! | range            | bucket            | label           | sort key |
//! |------------------|-------------------|-----------------|----------|
//! | `d == 0`         | [`Zero`]          | `0 sec`         | -1       |
//! | `0 < d <= 60`    | [`Seconds`]       | `23 sec`        | ⌊d⌋      |
//! | `60 < d <= 300`  | [`Window`]        | `61-90 sec`     | bin start|
//! | `d > 300`        | [`Overflow`]      | `>5 min`        | +∞       |
//!
//! Windows are 30 seconds wide and anchored at 61.
//!
//! [`Zero`]: DurationBucket::Zero
//! [`Seconds`]: DurationBucket::Seconds
//! [`Window`]: DurationBucket::Window
//! [`Overflow`]: DurationBucket::Overflow

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use super::filtering::FilteredUnits;

const WINDOW_ANCHOR: f64 = 61.0;
const WINDOW_WIDTH: f64 = 30.0;

/// A discrete, totally ordered duration category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DurationBucket {
    /// Exactly zero seconds (a rebound)
    Zero,
    /// Up to one minute, by whole second
    Seconds(u32),
    /// A 30 second window starting at the given second
    Window(u32),
    /// More than five minutes
    Overflow,
}

impl DurationBucket {
    /// Bucket for a duration. Anything under one second lands in `Zero`,
    /// which shares its `0 sec` label with the truncated seconds.
    pub fn of(duration: f64) -> Self {
        if duration.is_nan() || duration < 1.0 {
            DurationBucket::Zero
        } else if duration <= 60.0 {
            DurationBucket::Seconds(duration.trunc() as u32)
        } else if duration <= 300.0 {
            let start = ((duration - WINDOW_ANCHOR) / WINDOW_WIDTH).floor() * WINDOW_WIDTH
                + WINDOW_ANCHOR;
            DurationBucket::Window(start as u32)
        } else {
            DurationBucket::Overflow
        }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }

    /// Display order key: -1 for `Zero`, +∞ for `Overflow`.
    pub fn sort_key(&self) -> f64 {
        match self {
            DurationBucket::Zero => -1.0,
            DurationBucket::Seconds(s) | DurationBucket::Window(s) => f64::from(*s),
            DurationBucket::Overflow => f64::INFINITY,
        }
    }

    // Ties on the key (`31 sec` vs `31-60 sec`) put the single second first.
    fn rank(&self) -> (i64, u8) {
        match self {
            DurationBucket::Zero => (-1, 0),
            DurationBucket::Seconds(s) => (i64::from(*s), 0),
            DurationBucket::Window(s) => (i64::from(*s), 1),
            DurationBucket::Overflow => (i64::MAX, 0),
        }
    }
}

impl Ord for DurationBucket {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for DurationBucket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for DurationBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationBucket::Zero => write!(f, "0 sec"),
            DurationBucket::Seconds(s) => write!(f, "{} sec", s),
            DurationBucket::Window(s) => write!(f, "{}-{} sec", s, s + 29),
            DurationBucket::Overflow => write!(f, ">5 min"),
        }
    }
}

impl Serialize for DurationBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Bucket for a duration.
pub fn bucket(duration: f64) -> DurationBucket {
    DurationBucket::of(duration)
}

/// Sort buckets into display order.
pub fn order_buckets(buckets: &mut [DurationBucket]) {
    buckets.sort_unstable();
}

/// Unit counts of one reporting value, aligned with [`Histogram::buckets`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistogramSeries {
    pub value: String,
    pub counts: Vec<u64>,
}

/// Stacked histogram: buckets on one axis, one series per reporting value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Histogram {
    /// Buckets present in the filtered units, in display order
    pub buckets: Vec<DurationBucket>,
    /// One series per reporting value, sorted by value
    pub series: Vec<HistogramSeries>,
    /// Total units per bucket
    pub totals: Vec<u64>,
}

impl Histogram {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn position(&self, bucket: DurationBucket) -> Option<usize> {
        self.buckets.binary_search(&bucket).ok()
    }
}

/// Build the stacked histogram of the filtered units.
pub fn build_histogram(filtered: &FilteredUnits<'_>) -> Histogram {
    let reporting = filtered.reporting();
    let mut cells: BTreeMap<&str, BTreeMap<DurationBucket, u64>> = BTreeMap::new();
    let mut totals: BTreeMap<DurationBucket, u64> = BTreeMap::new();

    for record in filtered.records().iter().filter(|r| r.weight > 0) {
        let bucket = DurationBucket::of(record.duration);
        let cell = cells
            .entry(record.tag(reporting))
            .or_default()
            .entry(bucket)
            .or_default();
        *cell = cell.saturating_add(record.weight);
        let total = totals.entry(bucket).or_default();
        *total = total.saturating_add(record.weight);
    }

    let buckets: Vec<DurationBucket> = totals.keys().copied().collect();
    let series = cells
        .into_iter()
        .map(|(value, counts)| HistogramSeries {
            value: value.to_string(),
            counts: buckets
                .iter()
                .map(|b| counts.get(b).copied().unwrap_or(0))
                .collect(),
        })
        .collect();

    Histogram {
        totals: totals.into_values().collect(),
        buckets,
        series,
    }
}
