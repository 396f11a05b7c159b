//! Weighted row expansion.
//!
//! Each aggregated record is replayed `weight` times. Units are generated
//! lazily so the memory cost stays proportional to the number of records, not
//! to the total weight; every consumer only depends on the multiset of units,
//! never on their order.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{AggregatedRecord, Dataset, ExpandedUnit};

/// Lazy iterator over the units of a sequence of records.
///
/// Units come out grouped by record, in record order.
pub struct Units<'a, I>
where
    I: Iterator<Item = &'a AggregatedRecord>,
{
    records: I,
    current: Option<&'a AggregatedRecord>,
    remaining: u64,
    left_after_current: u64,
}

impl<'a, I> Units<'a, I>
where
    I: Iterator<Item = &'a AggregatedRecord> + Clone,
{
    pub fn new(records: I) -> Self {
        let left_after_current = records
            .clone()
            .fold(0u64, |total, r| total.saturating_add(r.weight));
        Self {
            records,
            current: None,
            remaining: 0,
            left_after_current,
        }
    }
}

impl<'a, I> Iterator for Units<'a, I>
where
    I: Iterator<Item = &'a AggregatedRecord>,
{
    type Item = ExpandedUnit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining == 0 {
            let record = self.records.next()?;
            self.current = Some(record);
            self.remaining = record.weight;
            self.left_after_current = self.left_after_current.saturating_sub(record.weight);
        }
        self.remaining -= 1;
        self.current.map(|record| ExpandedUnit {
            duration: record.duration,
            tags: &record.tags,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.remaining + self.left_after_current;
        match usize::try_from(left) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}

/// Expand a slice of records into units.
pub fn expand(records: &[AggregatedRecord]) -> Units<'_, std::slice::Iter<'_, AggregatedRecord>> {
    Units::new(records.iter())
}

/// Unit count per value of one dimension.
pub type ValueCounts = BTreeMap<String, u64>;

/// Cached expansion of one loaded dataset.
///
/// Built once per loaded table and reused for every filter change. Holds the
/// unfiltered per-value unit counts the threshold toggle is evaluated against.
#[derive(Debug, Clone)]
pub struct Expansion {
    dataset: Arc<Dataset>,
    total_units: u64,
    value_counts: Vec<ValueCounts>,
}

impl Expansion {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        let mut value_counts = vec![ValueCounts::new(); dataset.dimensions.len()];
        let mut total_units = 0u64;

        for record in dataset.records.iter().filter(|r| r.weight > 0) {
            total_units = total_units.saturating_add(record.weight);
            for (dim, counts) in value_counts.iter_mut().enumerate() {
                let count = counts.entry(record.tag(dim).to_string()).or_default();
                *count = count.saturating_add(record.weight);
            }
        }

        log::debug!(
            "Expanded {} records into {} units across {} dimensions",
            dataset.records.len(),
            total_units,
            dataset.dimensions.len()
        );

        Self {
            dataset,
            total_units,
            value_counts,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn records(&self) -> &[AggregatedRecord] {
        &self.dataset.records
    }

    pub fn units(&self) -> Units<'_, std::slice::Iter<'_, AggregatedRecord>> {
        expand(&self.dataset.records)
    }

    pub fn total_units(&self) -> u64 {
        self.total_units
    }

    /// Unfiltered unit count per value of the dimension at `dim`.
    ///
    /// Values whose records all have weight 0 are absent.
    pub fn value_counts(&self, dim: usize) -> &ValueCounts {
        static EMPTY: ValueCounts = ValueCounts::new();
        self.value_counts.get(dim).unwrap_or(&EMPTY)
    }

    pub fn reporting_counts(&self) -> &ValueCounts {
        self.value_counts(self.dataset.reporting)
    }
}

impl From<Dataset> for Expansion {
    fn from(dataset: Dataset) -> Self {
        Expansion::new(Arc::new(dataset))
    }
}
