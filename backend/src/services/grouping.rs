//! Per reporting value comparison table.
//!
//! Each group reports its volume and the share of its visits falling in four
//! duration classes: rebound (`d == 0`), short (`0 < d <= 30`), engaged
//! (`30 < d <= 180`) and top (`d > 180`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::filtering::FilteredUnits;

/// Duration class used by the comparison table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationClass {
    Rebound,
    Short,
    Engaged,
    Top,
}

impl DurationClass {
    pub const ALL: [DurationClass; 4] = [
        DurationClass::Rebound,
        DurationClass::Short,
        DurationClass::Engaged,
        DurationClass::Top,
    ];

    pub fn of(duration: f64) -> Self {
        if duration <= 0.0 {
            DurationClass::Rebound
        } else if duration <= 30.0 {
            DurationClass::Short
        } else if duration <= 180.0 {
            DurationClass::Engaged
        } else {
            DurationClass::Top
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// One row of the comparison table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub value: String,
    pub volume: u64,
    pub rebound_pct: f64,
    pub short_pct: f64,
    pub engaged_pct: f64,
    pub top_pct: f64,
}

impl GroupSummary {
    pub fn share(&self, class: DurationClass) -> f64 {
        match class {
            DurationClass::Rebound => self.rebound_pct,
            DurationClass::Short => self.short_pct,
            DurationClass::Engaged => self.engaged_pct,
            DurationClass::Top => self.top_pct,
        }
    }
}

/// Comparison table over the reporting values present after filtering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    /// Groups sorted by reporting value; groups with no volume are omitted
    pub groups: Vec<GroupSummary>,
}

impl ComparisonTable {
    /// Largest group volume, for proportional bar scaling.
    pub fn max_volume(&self) -> u64 {
        self.groups.iter().map(|g| g.volume).max().unwrap_or(0)
    }

    pub fn total_volume(&self) -> u64 {
        self.groups.iter().map(|g| g.volume).sum()
    }

    pub fn get(&self, value: &str) -> Option<&GroupSummary> {
        self.groups.iter().find(|g| g.value == value)
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Build the comparison table for `filtered`.
pub fn build_comparison(filtered: &FilteredUnits<'_>) -> ComparisonTable {
    let reporting = filtered.reporting();
    let mut tallies: BTreeMap<&str, [u64; 4]> = BTreeMap::new();

    for record in filtered.records() {
        let class = DurationClass::of(record.duration);
        let tally = &mut tallies.entry(record.tag(reporting)).or_default()[class.index()];
        *tally = tally.saturating_add(record.weight);
    }

    let groups = tallies
        .into_iter()
        .filter_map(|(value, classes)| {
            let volume = classes.iter().fold(0u64, |sum, c| sum.saturating_add(*c));
            (volume > 0).then(|| GroupSummary {
                value: value.to_string(),
                volume,
                rebound_pct: percent(classes[0], volume),
                short_pct: percent(classes[1], volume),
                engaged_pct: percent(classes[2], volume),
                top_pct: percent(classes[3], volume),
            })
        })
        .collect();

    ComparisonTable { groups }
}
