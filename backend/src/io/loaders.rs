//! Loaders turning CSV, JSON or Excel tables into a validated [`Dataset`].
//!
//! The header is checked against the [`SchemaDescriptor`] before any row is
//! read; a missing column aborts the whole load. Cell-level problems never
//! abort: they fall back to 0 (numbers) or `N/A` (dimension values) and are
//! tallied in the dataset's [`CoercionReport`]. The one row-level failure is
//! a total weight that does not fit in a `u64`.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::Value;
use std::io::{Cursor, Read};
use std::path::Path;

use super::schema::{ResolvedSchema, SchemaDescriptor, SchemaError};
use crate::models::{
    coerce_duration, coerce_weight, normalize_tag, parse_number, AggregatedRecord,
    CoercionReport, Dataset,
};

/// Represents the source format of an uploaded table
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Json,
    Xlsx,
}

impl std::str::FromStr for SourceFormat {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "json" => Ok(SourceFormat::Json),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(SourceFormat::Xlsx),
            other => Err(LoadError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Errors that abort a load.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to parse JSON rows: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Expected a JSON array of row objects")]
    NotARowArray,

    #[error("Input table has no header")]
    Empty,

    #[error("Failed to read workbook: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Workbook has no sheet named '{sheet}' (found: {})", .available.join(", "))]
    MissingSheet { sheet: String, available: Vec<String> },

    #[error("Input is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("Total weight overflows at row {row}")]
    WeightOverflow { row: usize },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

/// Sheet read from workbooks unless configured otherwise.
pub const DEFAULT_SHEET: &str = "DATA";

/// Options for CSV input.
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Unified interface for loading aggregated tables.
pub struct DatasetLoader {
    schema: SchemaDescriptor,
    csv: CsvOptions,
    sheet: String,
}

impl DatasetLoader {
    pub fn new(schema: SchemaDescriptor) -> Self {
        Self {
            schema,
            csv: CsvOptions::default(),
            sheet: DEFAULT_SHEET.to_string(),
        }
    }

    pub fn with_csv_options(mut self, csv: CsvOptions) -> Self {
        self.csv = csv;
        self
    }

    /// Worksheet to read from workbooks.
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = sheet.into();
        self
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    /// Load a file, picking the format from its extension.
    pub fn load_from_file(&self, path: &Path) -> Result<Dataset, LoadError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        let format: SourceFormat = extension.parse()?;
        let content = std::fs::read(path)?;
        self.load_bytes(&content, format)
    }

    pub fn load_str(&self, content: &str, format: SourceFormat) -> Result<Dataset, LoadError> {
        self.load_bytes(content.as_bytes(), format)
    }

    pub fn load_bytes(&self, content: &[u8], format: SourceFormat) -> Result<Dataset, LoadError> {
        match format {
            SourceFormat::Csv => self.load_csv(content),
            SourceFormat::Json => self.load_json_str(std::str::from_utf8(content)?),
            SourceFormat::Xlsx => self.load_xlsx(content),
        }
    }

    /// Load CSV from any reader.
    pub fn load_csv<R: Read>(&self, reader: R) -> Result<Dataset, LoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(self.csv.delimiter)
            .from_reader(reader);

        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if header.iter().all(|h| h.trim().is_empty()) {
            return Err(LoadError::Empty);
        }
        let resolved = self.schema.resolve(&header)?;

        let mut builder = RecordBuilder::new(&resolved);
        for (row, result) in reader.records().enumerate() {
            let record = result?;
            builder.push(
                row,
                |idx| record.get(idx).and_then(parse_number),
                |idx| record.get(idx).unwrap_or_default().to_string(),
            )?;
        }
        Ok(builder.finish())
    }

    /// Load a JSON array of row objects keyed by column name.
    ///
    /// The header is taken from the keys of the first row.
    pub fn load_json_str(&self, content: &str) -> Result<Dataset, LoadError> {
        let value: Value = serde_json::from_str(content)?;
        let rows = value.as_array().ok_or(LoadError::NotARowArray)?;
        let first = rows
            .first()
            .ok_or(LoadError::Empty)?
            .as_object()
            .ok_or(LoadError::NotARowArray)?;

        let header: Vec<String> = first.keys().cloned().collect();
        let resolved = self.schema.resolve(&header)?;

        let mut builder = RecordBuilder::new(&resolved);
        for (row, value) in rows.iter().enumerate() {
            let object = value.as_object().ok_or(LoadError::NotARowArray)?;
            let cell = |idx: usize| object.get(&header[idx]);
            builder.push(
                row,
                |idx| cell(idx).and_then(json_number),
                |idx| cell(idx).map(json_text).unwrap_or_default(),
            )?;
        }
        Ok(builder.finish())
    }

    /// Load the configured sheet of a workbook; its first row is the header.
    pub fn load_xlsx(&self, content: &[u8]) -> Result<Dataset, LoadError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(content))?;
        let available = workbook.sheet_names();
        if !available.iter().any(|name| *name == self.sheet) {
            return Err(LoadError::MissingSheet {
                sheet: self.sheet.clone(),
                available,
            });
        }
        let range = workbook.worksheet_range(&self.sheet)?;

        let mut rows = range.rows();
        let header: Vec<String> = rows
            .next()
            .ok_or(LoadError::Empty)?
            .iter()
            .map(cell_text)
            .collect();
        if header.iter().all(|h| h.trim().is_empty()) {
            return Err(LoadError::Empty);
        }
        let resolved = self.schema.resolve(&header)?;

        let mut builder = RecordBuilder::new(&resolved);
        for (row, cells) in rows.enumerate() {
            builder.push(
                row,
                |idx| cells.get(idx).and_then(cell_number),
                |idx| cells.get(idx).map(cell_text).unwrap_or_default(),
            )?;
        }
        Ok(builder.finish())
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Data::String(s) => parse_number(s),
        _ => None,
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

struct RecordBuilder<'a> {
    schema: &'a ResolvedSchema,
    records: Vec<AggregatedRecord>,
    coercions: CoercionReport,
    total_weight: u64,
}

impl<'a> RecordBuilder<'a> {
    fn new(schema: &'a ResolvedSchema) -> Self {
        Self {
            schema,
            records: Vec::new(),
            coercions: CoercionReport::default(),
            total_weight: 0,
        }
    }

    fn push<N, T>(&mut self, row: usize, number: N, text: T) -> Result<(), LoadError>
    where
        N: Fn(usize) -> Option<f64>,
        T: Fn(usize) -> String,
    {
        let schema = self.schema;
        let duration = coerce_duration(number(schema.duration));
        let weight = coerce_weight(number(schema.weight));
        self.total_weight = self
            .total_weight
            .checked_add(weight.value)
            .ok_or(LoadError::WeightOverflow { row })?;
        self.coercions.duration_fallbacks += usize::from(duration.fell_back);
        self.coercions.weight_fallbacks += usize::from(weight.fell_back);

        let tags = schema
            .dimensions
            .iter()
            .map(|&idx| {
                let tag = normalize_tag(&text(idx));
                self.coercions.missing_tags += usize::from(tag.fell_back);
                tag.value
            })
            .collect();

        self.records
            .push(AggregatedRecord::new(row, tags, duration.value, weight.value));
        Ok(())
    }

    fn finish(self) -> Dataset {
        let dataset = Dataset::new(
            self.schema.dimension_names.clone(),
            self.schema.reporting,
            self.records,
        )
        .with_coercions(self.coercions);

        if dataset.coercions.total() > 0 {
            log::debug!(
                "Coerced cells while loading: {} durations, {} weights, {} dimension values",
                dataset.coercions.duration_fallbacks,
                dataset.coercions.weight_fallbacks,
                dataset.coercions.missing_tags
            );
        }
        log::info!(
            "Loaded {} aggregated rows representing {} visits",
            dataset.records.len(),
            self.total_weight
        );
        dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MISSING_VALUE;

    const CSV: &str = "source,campaign,operator,duration,weight\n\
                       Google,Spring,Alpha,0,5\n\
                       Google,Spring,Alpha,45,3\n\
                       Bing,,Beta,abc,2\n\
                       Bing,Fall,Beta,12,-1\n";

    #[test]
    fn test_load_csv_with_coercions() {
        let dataset = DatasetLoader::new(SchemaDescriptor::default())
            .load_str(CSV, SourceFormat::Csv)
            .unwrap();

        assert_eq!(dataset.records.len(), 4);
        assert_eq!(dataset.dimensions, vec!["source", "campaign", "operator"]);
        assert_eq!(dataset.reporting_dimension(), "operator");
        assert_eq!(dataset.records[2].duration, 0.0);
        assert_eq!(dataset.records[2].tags[1], MISSING_VALUE);
        assert_eq!(dataset.records[3].weight, 0);
        assert_eq!(dataset.coercions.duration_fallbacks, 1);
        assert_eq!(dataset.coercions.weight_fallbacks, 1);
        assert_eq!(dataset.coercions.missing_tags, 1);
        assert_eq!(dataset.total_weight(), 10);
    }

    #[test]
    fn test_load_csv_missing_columns() {
        let err = DatasetLoader::new(SchemaDescriptor::default())
            .load_str("source,duration\nGoogle,3\n", SourceFormat::Csv)
            .unwrap_err();
        match err {
            LoadError::Schema(schema) => assert_eq!(
                schema.missing_columns(),
                vec!["weight", "campaign", "operator"]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_csv_semicolon_delimiter() {
        let content = "source;campaign;operator;duration;weight\nA;B;C;12,5;2\n";
        let dataset = DatasetLoader::new(SchemaDescriptor::default())
            .with_csv_options(CsvOptions { delimiter: b';' })
            .load_str(content, SourceFormat::Csv)
            .unwrap();
        assert_eq!(dataset.records[0].duration, 12.5);
        assert_eq!(dataset.records[0].weight, 2);
    }

    #[test]
    fn test_load_json_rows() {
        let content = r#"[
            {"source": "Google", "campaign": "Spring", "operator": "Alpha", "duration": 30, "weight": 2},
            {"source": "Bing", "campaign": null, "operator": "Beta", "duration": "7", "weight": 1.8}
        ]"#;
        let dataset = DatasetLoader::new(SchemaDescriptor::default())
            .load_str(content, SourceFormat::Json)
            .unwrap();
        assert_eq!(dataset.records.len(), 2);
        assert_eq!(dataset.records[1].duration, 7.0);
        assert_eq!(dataset.records[1].weight, 1);
        assert_eq!(dataset.records[1].tags[1], MISSING_VALUE);
    }

    #[test]
    fn test_load_json_rejects_non_array() {
        let err = DatasetLoader::new(SchemaDescriptor::default())
            .load_str(r#"{"rows": []}"#, SourceFormat::Json)
            .unwrap_err();
        assert!(matches!(err, LoadError::NotARowArray));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("CSV".parse::<SourceFormat>().unwrap(), SourceFormat::Csv);
        assert_eq!("XLSX".parse::<SourceFormat>().unwrap(), SourceFormat::Xlsx);
        assert!("parquet".parse::<SourceFormat>().is_err());
    }

    #[test]
    fn test_total_weight_overflow_is_rejected() {
        let content = "source,campaign,operator,duration,weight
                       G,S,A,10,1e19
                       G,S,A,20,1e19
";
        let err = DatasetLoader::new(SchemaDescriptor::default())
            .load_str(content, SourceFormat::Csv)
            .unwrap_err();
        assert!(matches!(err, LoadError::WeightOverflow { row: 1 }));
    }

    #[test]
    fn test_single_huge_weight_loads() {
        let content = "source,campaign,operator,duration,weight
G,S,A,10,1e19
";
        let dataset = DatasetLoader::new(SchemaDescriptor::default())
            .load_str(content, SourceFormat::Csv)
            .unwrap();
        assert_eq!(dataset.total_weight(), 10_000_000_000_000_000_000);
    }

    #[test]
    fn test_xlsx_rejects_non_workbook_bytes() {
        let err = DatasetLoader::new(SchemaDescriptor::default())
            .load_bytes(b"duration,weight\n", SourceFormat::Xlsx)
            .unwrap_err();
        assert!(matches!(err, LoadError::Workbook(_)));
    }
}
