//! Application configuration.
//!
//! Settings are read from a TOML file. Every section is optional and falls
//! back to its defaults, so an empty file is a valid configuration:
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//!
//! [analytics]
//! default_threshold = 100
//! default_mode = "engagement-only"
//!
//! [schema]
//! preset = "legacy_export"
//! delimiter = ";"
//! sheet = "DATA"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::io::{CsvOptions, DatasetLoader, SchemaDescriptor, SchemaError, DEFAULT_SHEET};
use crate::models::{CalculationMode, FilterState, ThresholdToggle, DEFAULT_THRESHOLD};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "SESSION_ANALYTICS_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub analytics: AnalyticsSettings,
    #[serde(default)]
    pub schema: SchemaSettings,
    #[serde(default)]
    pub presentation: PresentationSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size, in MiB
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_body_limit_mb() -> usize {
    50
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_mb: default_body_limit_mb(),
        }
    }
}

impl ServerSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb * 1024 * 1024
    }
}

/// Initial filter state of a new session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSettings {
    #[serde(default = "default_threshold")]
    pub default_threshold: u64,
    #[serde(default)]
    pub default_mode: CalculationMode,
    #[serde(default)]
    pub threshold_enabled: bool,
}

fn default_threshold() -> u64 {
    DEFAULT_THRESHOLD
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            default_threshold: DEFAULT_THRESHOLD,
            default_mode: CalculationMode::default(),
            threshold_enabled: false,
        }
    }
}

/// Input layout: a named preset or a custom descriptor, plus the CSV
/// delimiter and the workbook sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSettings {
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub custom: Option<SchemaDescriptor>,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_sheet")]
    pub sheet: String,
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_sheet() -> String {
    DEFAULT_SHEET.to_string()
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            preset: None,
            custom: None,
            delimiter: default_delimiter(),
            sheet: default_sheet(),
        }
    }
}

/// Colour and dash style of one statistic marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub color: String,
    pub dash: String,
}

impl MarkerStyle {
    fn new(color: &str, dash: &str) -> Self {
        Self {
            color: color.to_string(),
            dash: dash.to_string(),
        }
    }
}

/// Marker styles handed to the presentation layer with each report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerPalette {
    #[serde(default = "default_q1")]
    pub q1: MarkerStyle,
    #[serde(default = "default_median")]
    pub median: MarkerStyle,
    #[serde(default = "default_q3")]
    pub q3: MarkerStyle,
    #[serde(default = "default_mean")]
    pub mean: MarkerStyle,
}

fn default_q1() -> MarkerStyle {
    MarkerStyle::new("#3498db", "dot")
}

fn default_median() -> MarkerStyle {
    MarkerStyle::new("#e74c3c", "solid")
}

fn default_q3() -> MarkerStyle {
    MarkerStyle::new("#2ecc71", "dot")
}

fn default_mean() -> MarkerStyle {
    MarkerStyle::new("#f39c12", "dash")
}

impl Default for MarkerPalette {
    fn default() -> Self {
        Self {
            q1: default_q1(),
            median: default_median(),
            q3: default_q3(),
            mean: default_mean(),
        }
    }
}

impl MarkerPalette {
    /// Style for a marker name as emitted in reports (`Q1`, `MED`, `Q3`, `MOY`).
    pub fn style(&self, marker: &str) -> Option<&MarkerStyle> {
        match marker {
            "Q1" => Some(&self.q1),
            "MED" => Some(&self.median),
            "Q3" => Some(&self.q3),
            "MOY" => Some(&self.mean),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationSettings {
    #[serde(default)]
    pub markers: MarkerPalette,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration from the process environment.
    ///
    /// Reads the file named by `SESSION_ANALYTICS_CONFIG` when set, otherwise
    /// the first `session-analytics.toml` found in the usual locations, and
    /// falls back to defaults. `HOST` and `PORT` override the server section.
    pub fn load() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();
        let mut config = match lookup(CONFIG_ENV) {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_location() {
                Some(path) => Self::from_file(path)?,
                None => Self::default(),
            },
        };
        config.apply_env_overrides(lookup)?;
        Ok(config)
    }

    fn default_location() -> Option<PathBuf> {
        [
            "session-analytics.toml",
            "backend/session-analytics.toml",
            "../session-analytics.toml",
        ]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
    }

    /// Apply `HOST`/`PORT` overrides from `lookup`.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT '{}' is not a valid port", port)))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.csv_options()?;
        self.schema_descriptor()?;
        Ok(())
    }

    /// Descriptor selected by the `[schema]` section.
    ///
    /// A custom descriptor takes precedence over a preset; neither means the
    /// default layout.
    pub fn schema_descriptor(&self) -> Result<SchemaDescriptor, ConfigError> {
        let descriptor = match (&self.schema.custom, &self.schema.preset) {
            (Some(custom), _) => custom.clone(),
            (None, Some(name)) => SchemaDescriptor::preset(name)
                .ok_or_else(|| ConfigError::Invalid(format!("Unknown schema preset '{}'", name)))?,
            (None, None) => SchemaDescriptor::default(),
        };
        descriptor.check()?;
        Ok(descriptor)
    }

    pub fn csv_options(&self) -> Result<CsvOptions, ConfigError> {
        match self.schema.delimiter.as_bytes() {
            [byte] => Ok(CsvOptions { delimiter: *byte }),
            _ => Err(ConfigError::Invalid(format!(
                "CSV delimiter must be a single byte, got '{}'",
                self.schema.delimiter
            ))),
        }
    }

    /// Loader for the configured layout.
    pub fn loader(&self) -> Result<DatasetLoader, ConfigError> {
        Ok(DatasetLoader::new(self.schema_descriptor()?)
            .with_csv_options(self.csv_options()?)
            .with_sheet(self.schema.sheet.clone()))
    }

    /// Filter state a new session starts with.
    pub fn default_filter_state(&self) -> FilterState {
        FilterState::new()
            .with_mode(self.analytics.default_mode)
            .with_threshold(ThresholdToggle {
                enabled: self.analytics.threshold_enabled,
                min_volume: self.analytics.default_threshold,
            })
    }
}
