//! A validated, loaded table of aggregated records.

use serde::{Deserialize, Serialize};

use super::record::AggregatedRecord;

/// Counters for cells that were silently replaced while loading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionReport {
    /// Durations that were unparsable, non-finite or negative (now 0)
    pub duration_fallbacks: usize,
    /// Weights that were unparsable, non-finite or negative (now 0)
    pub weight_fallbacks: usize,
    /// Dimension cells that were blank or `nan` (now `N/A`)
    pub missing_tags: usize,
}

impl CoercionReport {
    pub fn total(&self) -> usize {
        self.duration_fallbacks + self.weight_fallbacks + self.missing_tags
    }
}

/// Aggregated records together with the dimension layout they were read with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Logical dimension names, in tag order
    pub dimensions: Vec<String>,
    /// Index into `dimensions` of the reporting dimension
    pub reporting: usize,
    pub records: Vec<AggregatedRecord>,
    #[serde(default)]
    pub coercions: CoercionReport,
}

impl Dataset {
    pub fn new(dimensions: Vec<String>, reporting: usize, records: Vec<AggregatedRecord>) -> Self {
        Self {
            dimensions,
            reporting,
            records,
            coercions: CoercionReport::default(),
        }
    }

    pub fn with_coercions(mut self, coercions: CoercionReport) -> Self {
        self.coercions = coercions;
        self
    }

    pub fn dimension_index(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d == name)
    }

    pub fn reporting_dimension(&self) -> &str {
        self.dimensions
            .get(self.reporting)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Sum of all record weights, i.e. the number of expanded units.
    ///
    /// Saturates at `u64::MAX`; loaders reject tables whose total does not fit.
    pub fn total_weight(&self) -> u64 {
        self.records
            .iter()
            .fold(0u64, |total, r| total.saturating_add(r.weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_lookup() {
        let dataset = Dataset::new(
            vec!["source".into(), "operator".into()],
            1,
            vec![
                AggregatedRecord::new(0, vec!["s".into(), "o".into()], 3.0, 4),
                AggregatedRecord::new(1, vec!["s".into(), "p".into()], 0.0, 6),
            ],
        );
        assert_eq!(dataset.reporting_dimension(), "operator");
        assert_eq!(dataset.dimension_index("source"), Some(0));
        assert_eq!(dataset.dimension_index("campaign"), None);
        assert_eq!(dataset.total_weight(), 10);
    }
}
