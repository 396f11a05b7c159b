//! Schema descriptor: logical fields mapped onto physical column names.
//!
//! The descriptor is validated once, against the header of the incoming table,
//! before any row is read. Validation either resolves every logical field to a
//! column index or reports every missing one at once.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One logical field and the physical column that carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub field: String,
    pub column: String,
}

impl FieldMapping {
    pub fn new(field: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            column: column.into(),
        }
    }
}

/// A required field that has no matching column in the input header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingField {
    pub field: String,
    pub column: String,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' (field {})", self.column, self.field)
    }
}

/// Error raised when a descriptor cannot be applied to an input table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The header lacks one or more required columns.
    #[error("Missing required columns: {}", format_missing(.missing))]
    MissingColumns { missing: Vec<MissingField> },

    /// The descriptor itself is inconsistent.
    #[error("Invalid schema descriptor: {0}")]
    InvalidDescriptor(String),
}

fn format_missing(missing: &[MissingField]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl SchemaError {
    /// Physical names of the missing columns, in descriptor order.
    pub fn missing_columns(&self) -> Vec<String> {
        match self {
            SchemaError::MissingColumns { missing } => {
                missing.iter().map(|m| m.column.clone()).collect()
            }
            SchemaError::InvalidDescriptor(_) => Vec::new(),
        }
    }
}

/// Required logical-field-to-column mappings for a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub duration: FieldMapping,
    pub weight: FieldMapping,
    /// Dimension columns, in the order tags are stored
    pub dimensions: Vec<FieldMapping>,
    /// Logical name of the dimension subject to the threshold toggle
    pub reporting: String,
}

impl Default for SchemaDescriptor {
    fn default() -> Self {
        Self {
            duration: FieldMapping::new("duration", "duration"),
            weight: FieldMapping::new("weight", "weight"),
            dimensions: vec![
                FieldMapping::new("source", "source"),
                FieldMapping::new("campaign", "campaign"),
                FieldMapping::new("operator", "operator"),
            ],
            reporting: "operator".to_string(),
        }
    }
}

impl SchemaDescriptor {
    /// Header layout of the legacy spreadsheet export, where the weight lives
    /// in a column named after the source and the operator in `Visites`.
    pub fn legacy_export() -> Self {
        Self {
            duration: FieldMapping::new("duration", "Durée"),
            weight: FieldMapping::new("weight", "Source recodifiée"),
            dimensions: vec![
                FieldMapping::new("source", "Source recodifiée2"),
                FieldMapping::new("campaign", "Campagne recodifiée"),
                FieldMapping::new("operator", "Visites"),
            ],
            reporting: "operator".to_string(),
        }
    }

    /// Look up a named preset (`default` or `legacy_export`).
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "legacy_export" | "legacy-export" => Some(Self::legacy_export()),
            _ => None,
        }
    }

    pub fn dimension_names(&self) -> Vec<String> {
        self.dimensions.iter().map(|d| d.field.clone()).collect()
    }

    /// Check internal consistency: the reporting field must be one of the
    /// dimensions and logical names must be unique.
    pub fn check(&self) -> Result<usize, SchemaError> {
        if self.dimensions.is_empty() {
            return Err(SchemaError::InvalidDescriptor(
                "at least one dimension is required".to_string(),
            ));
        }
        let mut names: Vec<&str> = vec![&self.duration.field, &self.weight.field];
        names.extend(self.dimensions.iter().map(|d| d.field.as_str()));
        let mut sorted = names.clone();
        sorted.sort_unstable();
        if let Some(dup) = sorted.windows(2).find(|w| w[0] == w[1]) {
            return Err(SchemaError::InvalidDescriptor(format!(
                "field '{}' is declared more than once",
                dup[0]
            )));
        }
        self.dimensions
            .iter()
            .position(|d| d.field == self.reporting)
            .ok_or_else(|| {
                SchemaError::InvalidDescriptor(format!(
                    "reporting dimension '{}' is not a declared dimension",
                    self.reporting
                ))
            })
    }

    /// Resolve every mapping against `header`, reporting all missing columns.
    pub fn resolve<S: AsRef<str>>(&self, header: &[S]) -> Result<ResolvedSchema, SchemaError> {
        let reporting = self.check()?;

        let mut missing = Vec::new();
        let mut locate = |mapping: &FieldMapping| -> Option<usize> {
            let found = header.iter().position(|h| h.as_ref().trim() == mapping.column);
            if found.is_none() {
                missing.push(MissingField {
                    field: mapping.field.clone(),
                    column: mapping.column.clone(),
                });
            }
            found
        };

        let duration = locate(&self.duration);
        let weight = locate(&self.weight);
        let dimensions: Vec<Option<usize>> = self.dimensions.iter().map(&mut locate).collect();

        match (duration, weight) {
            (Some(duration), Some(weight)) if missing.is_empty() => Ok(ResolvedSchema {
                duration,
                weight,
                dimensions: dimensions.into_iter().flatten().collect(),
                dimension_names: self.dimension_names(),
                reporting,
            }),
            _ => Err(SchemaError::MissingColumns { missing }),
        }
    }
}

/// Column indices produced by [`SchemaDescriptor::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchema {
    pub duration: usize,
    pub weight: usize,
    pub dimensions: Vec<usize>,
    pub dimension_names: Vec<String>,
    pub reporting: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_default_header() {
        let header = ["source", "campaign", "operator", "duration", "weight"];
        let resolved = SchemaDescriptor::default().resolve(&header).unwrap();
        assert_eq!(resolved.duration, 3);
        assert_eq!(resolved.weight, 4);
        assert_eq!(resolved.dimensions, vec![0, 1, 2]);
        assert_eq!(resolved.reporting, 2);
    }

    #[test]
    fn test_resolve_reports_every_missing_column() {
        let header = ["source", "duration"];
        let err = SchemaDescriptor::default().resolve(&header).unwrap_err();
        assert_eq!(
            err.missing_columns(),
            vec!["weight".to_string(), "campaign".to_string(), "operator".to_string()]
        );
        assert!(err.to_string().contains("'operator'"));
    }

    #[test]
    fn test_legacy_export_preset() {
        let header = [
            "Durée",
            "Source recodifiée",
            "Source recodifiée2",
            "Visites",
            "Campagne recodifiée",
        ];
        let resolved = SchemaDescriptor::preset("legacy_export")
            .unwrap()
            .resolve(&header)
            .unwrap();
        assert_eq!(resolved.weight, 1);
        assert_eq!(resolved.dimensions, vec![2, 4, 3]);
        assert!(SchemaDescriptor::preset("unknown").is_none());
    }

    #[test]
    fn test_reporting_must_be_a_dimension() {
        let descriptor = SchemaDescriptor {
            reporting: "region".to_string(),
            ..SchemaDescriptor::default()
        };
        assert!(matches!(
            descriptor.check(),
            Err(SchemaError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_duplicate_fields_rejected() {
        let mut descriptor = SchemaDescriptor::default();
        descriptor
            .dimensions
            .push(FieldMapping::new("source", "source_2"));
        assert!(descriptor.check().is_err());
    }
}
