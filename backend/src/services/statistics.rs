//! Session statistics over the filtered units.
//!
//! Quartiles use linear interpolation between closest ranks (position
//! `q * (n - 1)` in the sorted durations). They are computed from the
//! weighted records through a cumulative-weight rank lookup, which selects
//! exactly the same order statistics as sorting the expanded units, so the
//! result is identical to [`quantile_sorted`] over the materialised durations.
//! The mean is `Σ d·w / Σ w` over the same records, so no statistic costs more
//! than one pass over the records, whatever their weights.

use serde::{Deserialize, Serialize};

use super::filtering::FilteredUnits;
use crate::models::CalculationMode;

/// Descriptive statistics for one filter state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionStatistics {
    /// Number of filtered units, regardless of mode
    pub count: u64,
    /// Share of filtered units with duration 0, in percent
    pub rebound_rate: f64,
    /// Number of durations the mean and quartiles were computed over
    pub sample_size: u64,
    pub mean: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub mode: CalculationMode,
}

impl SessionStatistics {
    pub fn empty(mode: CalculationMode) -> Self {
        Self {
            count: 0,
            rebound_rate: 0.0,
            sample_size: 0,
            mean: 0.0,
            q1: 0.0,
            median: 0.0,
            q3: 0.0,
            mode,
        }
    }
}

/// Linear interpolation matching the closest-ranks estimator, arranged so
/// that `t == 0` and `t == 1` return the end points exactly.
fn lerp(lo: f64, hi: f64, t: f64) -> f64 {
    let diff = hi - lo;
    if t >= 0.5 {
        hi - diff * (1.0 - t)
    } else {
        lo + diff * t
    }
}

/// Quantile `q` in `[0, 1]` of already sorted values; 0 when empty.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    lerp(sorted[lo], sorted[hi], pos - lo as f64)
}

/// Durations with their multiplicity, sorted by duration.
#[derive(Debug, Clone, Default)]
pub struct WeightedSample {
    values: Vec<f64>,
    cumulative: Vec<u64>,
    weighted_sum: f64,
}

impl WeightedSample {
    pub fn new(mut pairs: Vec<(f64, u64)>) -> Self {
        pairs.retain(|&(_, w)| w > 0);
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut running = 0u64;
        let mut weighted_sum = 0.0;
        let (values, cumulative): (Vec<f64>, Vec<u64>) = pairs
            .into_iter()
            .map(|(v, w)| {
                running = running.saturating_add(w);
                weighted_sum += v * w as f64;
                (v, running)
            })
            .unzip();
        Self {
            values,
            cumulative,
            weighted_sum,
        }
    }

    pub fn len(&self) -> u64 {
        self.cumulative.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at zero-based `rank` of the expanded, sorted sample.
    fn at_rank(&self, rank: u64) -> f64 {
        let idx = self.cumulative.partition_point(|&c| c <= rank);
        self.values[idx.min(self.values.len() - 1)]
    }

    /// Same result as [`quantile_sorted`] over the expanded sample.
    pub fn quantile(&self, q: f64) -> f64 {
        let n = self.len();
        if n == 0 {
            return 0.0;
        }
        let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
        let lo = pos.floor() as u64;
        let hi = pos.ceil() as u64;
        lerp(self.at_rank(lo), self.at_rank(hi), pos - lo as f64)
    }

    /// Weighted mean; 0 when empty.
    pub fn mean(&self) -> f64 {
        match self.len() {
            0 => 0.0,
            n => self.weighted_sum / n as f64,
        }
    }
}

/// Compute count, rebound rate, mean and quartiles for `filtered`.
///
/// All outputs are 0 when nothing survives filtering or when the mode leaves
/// no durations.
pub fn compute_statistics(filtered: &FilteredUnits<'_>, mode: CalculationMode) -> SessionStatistics {
    let count = filtered.count();
    if count == 0 {
        return SessionStatistics::empty(mode);
    }

    let rebounds = filtered
        .records()
        .iter()
        .filter(|r| r.duration == 0.0)
        .fold(0u64, |total, r| total.saturating_add(r.weight));
    let rebound_rate = rebounds as f64 / count as f64 * 100.0;

    let sample = WeightedSample::new(
        filtered
            .records()
            .iter()
            .filter(|r| mode.admits(r.duration))
            .map(|r| (r.duration, r.weight))
            .collect(),
    );

    SessionStatistics {
        count,
        rebound_rate,
        sample_size: sample.len(),
        mean: sample.mean(),
        q1: sample.quantile(0.25),
        median: sample.quantile(0.5),
        q3: sample.quantile(0.75),
        mode,
    }
}
