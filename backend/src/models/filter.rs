//! Interactive filter state.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Minimum unfiltered volume a reporting value needs when the toggle is on.
pub const DEFAULT_THRESHOLD: u64 = 100;

/// Which durations feed the mean and quartiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalculationMode {
    /// Every filtered visit, rebounds included
    IncludeZero,
    /// Only visits with a duration above 0
    #[default]
    EngagementOnly,
}

impl CalculationMode {
    pub fn admits(self, duration: f64) -> bool {
        match self {
            CalculationMode::IncludeZero => true,
            CalculationMode::EngagementOnly => duration > 0.0,
        }
    }
}

impl std::str::FromStr for CalculationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "include-zero" | "include_zero" => Ok(CalculationMode::IncludeZero),
            "engagement-only" | "engagement_only" | "engagement" => {
                Ok(CalculationMode::EngagementOnly)
            }
            other => Err(format!(
                "Invalid calculation mode: {}. Must be 'include-zero' or 'engagement-only'",
                other
            )),
        }
    }
}

/// "Keep only high-volume values" switch on the reporting dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdToggle {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_threshold")]
    pub min_volume: u64,
}

fn default_threshold() -> u64 {
    DEFAULT_THRESHOLD
}

impl Default for ThresholdToggle {
    fn default() -> Self {
        Self {
            enabled: false,
            min_volume: DEFAULT_THRESHOLD,
        }
    }
}

impl ThresholdToggle {
    pub fn on(min_volume: u64) -> Self {
        Self {
            enabled: true,
            min_volume,
        }
    }
}

/// Explicit selections per dimension plus the threshold toggle and mode.
///
/// An absent or empty selection means "no restriction" on that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub selections: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    pub threshold: ThresholdToggle,
    #[serde(default)]
    pub mode: CalculationMode,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select<I, S>(mut self, dimension: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selections
            .entry(dimension.to_string())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn with_threshold(mut self, threshold: ThresholdToggle) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_mode(mut self, mode: CalculationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Non-empty selection for `dimension`, if any.
    pub fn selection(&self, dimension: &str) -> Option<&BTreeSet<String>> {
        self.selections.get(dimension).filter(|s| !s.is_empty())
    }
}
