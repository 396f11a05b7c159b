//! Filter composition for the expanded unit set.
//!
//! Dimensions combine with AND; values selected within one dimension combine
//! with OR. The reporting dimension additionally obeys the threshold toggle,
//! and the toggle always wins: an explicit selection can narrow what the
//! toggle allows but never widen it.

use std::collections::BTreeSet;

use super::expansion::{Expansion, Units, ValueCounts};
use crate::error::ProcessingError;
use crate::models::{AggregatedRecord, FilterState, ThresholdToggle};

/// Reporting values whose unfiltered count meets the threshold.
///
/// With the toggle off every value present in `counts` is allowed.
pub fn allowed_values(counts: &ValueCounts, toggle: bool, threshold: u64) -> BTreeSet<String> {
    counts
        .iter()
        .filter(|(_, &count)| !toggle || count >= threshold)
        .map(|(value, _)| value.clone())
        .collect()
}

/// Effective inclusion set of the reporting dimension.
///
/// `explicit ∩ allowed` when a selection exists, otherwise `allowed`. The
/// result never depends on the order in which the toggle and the selection
/// were changed.
pub fn compose(
    counts: &ValueCounts,
    toggle: bool,
    threshold: u64,
    explicit: &BTreeSet<String>,
) -> BTreeSet<String> {
    let allowed = allowed_values(counts, toggle, threshold);
    if explicit.is_empty() {
        allowed
    } else {
        explicit.intersection(&allowed).cloned().collect()
    }
}

/// Inclusion predicate for one dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inclusion {
    Any,
    Only(BTreeSet<String>),
}

impl Inclusion {
    pub fn admits(&self, value: &str) -> bool {
        match self {
            Inclusion::Any => true,
            Inclusion::Only(values) => values.contains(value),
        }
    }
}

/// Per-dimension predicates resolved from a [`FilterState`].
#[derive(Debug, Clone)]
pub struct FilterPlan {
    inclusions: Vec<Inclusion>,
    reporting: usize,
    threshold: ThresholdToggle,
}

impl FilterPlan {
    /// Resolve `state` against the unfiltered counts of `expansion`.
    ///
    /// Fails when a non-empty selection names a dimension the dataset does
    /// not have. An empty selection restricts nothing, whatever its name.
    pub fn build(expansion: &Expansion, state: &FilterState) -> Result<Self, ProcessingError> {
        let dataset = expansion.dataset();
        if let Some((unknown, _)) = state
            .selections
            .iter()
            .find(|(name, values)| !values.is_empty() && dataset.dimension_index(name).is_none())
        {
            return Err(ProcessingError::UnknownDimension(unknown.clone()));
        }

        let empty = BTreeSet::new();
        let inclusions = dataset
            .dimensions
            .iter()
            .enumerate()
            .map(|(dim, name)| {
                let selection = state.selection(name);
                if dim == dataset.reporting {
                    Inclusion::Only(compose(
                        expansion.value_counts(dim),
                        state.threshold.enabled,
                        state.threshold.min_volume,
                        selection.unwrap_or(&empty),
                    ))
                } else {
                    match selection {
                        Some(values) => Inclusion::Only(values.clone()),
                        None => Inclusion::Any,
                    }
                }
            })
            .collect();

        Ok(Self {
            inclusions,
            reporting: dataset.reporting,
            threshold: state.threshold,
        })
    }

    pub fn inclusion(&self, dim: usize) -> Option<&Inclusion> {
        self.inclusions.get(dim)
    }

    pub fn admits(&self, record: &AggregatedRecord) -> bool {
        self.inclusions
            .iter()
            .enumerate()
            .all(|(dim, inclusion)| inclusion.admits(record.tag(dim)))
    }

    /// Apply the plan, then re-enforce the threshold on the result.
    pub fn apply<'a>(&self, expansion: &'a Expansion) -> FilteredUnits<'a> {
        let records: Vec<&AggregatedRecord> = expansion
            .records()
            .iter()
            .filter(|r| r.weight > 0 && self.admits(r))
            .collect();

        let mut filtered = FilteredUnits {
            records,
            reporting: self.reporting,
        };
        enforce_threshold(&mut filtered, expansion.reporting_counts(), self.threshold);
        filtered
    }
}

/// Drop every unit whose reporting value falls below the threshold.
///
/// The allowed set is derived fresh from the unfiltered counts, so a stale or
/// partially applied selection cannot leak a low-volume value through.
/// Returns the number of units removed.
pub fn enforce_threshold(
    filtered: &mut FilteredUnits<'_>,
    counts: &ValueCounts,
    threshold: ThresholdToggle,
) -> u64 {
    if !threshold.enabled {
        return 0;
    }
    let allowed = allowed_values(counts, true, threshold.min_volume);
    let reporting = filtered.reporting;
    let before = filtered.count();
    filtered
        .records
        .retain(|r| allowed.contains(r.tag(reporting)));
    let dropped = before - filtered.count();
    if dropped > 0 {
        log::warn!(
            "Threshold re-enforcement removed {} units below volume {}",
            dropped,
            threshold.min_volume
        );
    }
    dropped
}

/// Result of filtering: the surviving records, expanded on demand.
#[derive(Debug, Clone)]
pub struct FilteredUnits<'a> {
    records: Vec<&'a AggregatedRecord>,
    reporting: usize,
}

impl<'a> FilteredUnits<'a> {
    pub fn new(records: Vec<&'a AggregatedRecord>, reporting: usize) -> Self {
        Self { records, reporting }
    }

    pub fn records(&self) -> &[&'a AggregatedRecord] {
        &self.records
    }

    pub fn reporting(&self) -> usize {
        self.reporting
    }

    pub fn units(&self) -> Units<'a, std::iter::Copied<std::slice::Iter<'_, &'a AggregatedRecord>>> {
        Units::new(self.records.iter().copied())
    }

    /// Number of filtered units.
    pub fn count(&self) -> u64 {
        self.records
            .iter()
            .fold(0u64, |total, r| total.saturating_add(r.weight))
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Reporting values present in the filtered units, sorted.
    pub fn reporting_values(&self) -> BTreeSet<&'a str> {
        self.records
            .iter()
            .filter(|r| r.weight > 0)
            .map(|r| r.tag(self.reporting))
            .collect()
    }
}
