//! Aggregated visit rows and the individual visits reconstructed from them.
//!
//! An [`AggregatedRecord`] summarises `weight` identical visits sharing the
//! same dimension tags and duration. Expansion replays each record `weight`
//! times as [`ExpandedUnit`]s; units borrow their tags from the record so a
//! large weight never duplicates strings.

use serde::{Deserialize, Serialize};

/// Placeholder used for empty or missing dimension cells.
pub const MISSING_VALUE: &str = "N/A";

/// Dimension values of one record, aligned with [`crate::models::Dataset::dimensions`].
pub type DimensionTags = Vec<String>;

/// One input row of the aggregated export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    /// Zero-based position of the row in the source table
    pub row: usize,
    /// Dimension values, one per dataset dimension
    pub tags: DimensionTags,
    /// Visit duration in seconds (never negative)
    pub duration: f64,
    /// Number of real visits this row stands for
    pub weight: u64,
}

impl AggregatedRecord {
    pub fn new(row: usize, tags: DimensionTags, duration: f64, weight: u64) -> Self {
        Self {
            row,
            tags,
            duration,
            weight,
        }
    }

    /// Value of the dimension at `index`, or [`MISSING_VALUE`] when out of range.
    pub fn tag(&self, index: usize) -> &str {
        self.tags
            .get(index)
            .map(String::as_str)
            .unwrap_or(MISSING_VALUE)
    }
}

/// One reconstructed visit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpandedUnit<'a> {
    pub duration: f64,
    pub tags: &'a [String],
}

impl<'a> ExpandedUnit<'a> {
    pub fn tag(&self, index: usize) -> &'a str {
        self.tags
            .get(index)
            .map(String::as_str)
            .unwrap_or(MISSING_VALUE)
    }
}

/// Result of coercing a raw cell into a number.
///
/// `fell_back` is set when the cell could not be used as-is and the value was
/// replaced (by 0) or clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coerced<T> {
    pub value: T,
    pub fell_back: bool,
}

/// Parse a numeric cell. Accepts surrounding whitespace and a decimal comma.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = trimmed
        .parse::<f64>()
        .or_else(|_| trimmed.replace(',', ".").parse::<f64>())
        .ok()?;
    parsed.is_finite().then_some(parsed)
}

/// Coerce a duration cell: unparsable, non-finite and negative values become 0.
pub fn coerce_duration(raw: Option<f64>) -> Coerced<f64> {
    match raw {
        Some(d) if d.is_finite() && d >= 0.0 => Coerced {
            value: d,
            fell_back: false,
        },
        _ => Coerced {
            value: 0.0,
            fell_back: true,
        },
    }
}

/// Coerce a weight cell: unparsable, non-finite and negative values become 0,
/// fractional values truncate toward 0.
pub fn coerce_weight(raw: Option<f64>) -> Coerced<u64> {
    match raw {
        Some(w) if w.is_finite() && w >= 0.0 => Coerced {
            // `as` saturates for values beyond u64::MAX
            value: w.trunc() as u64,
            fell_back: false,
        },
        _ => Coerced {
            value: 0,
            fell_back: true,
        },
    }
}

/// Normalise a text dimension cell; blanks and `nan` become [`MISSING_VALUE`].
pub fn normalize_tag(raw: &str) -> Coerced<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        Coerced {
            value: MISSING_VALUE.to_string(),
            fell_back: true,
        }
    } else {
        Coerced {
            value: trimmed.to_string(),
            fell_back: false,
        }
    }
}
