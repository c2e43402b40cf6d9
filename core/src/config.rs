//! Configuration for parsing and report rendering.
//!
//! `ParseConfig` controls how the parser treats anomalies it tolerates;
//! `ReportConfig` collects the knobs the spreadsheet renderers consume.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error_codes;

/// What the parser does when two data lines share a composite key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeyPolicy {
    /// Keep the later record without comment.
    Overwrite,
    /// Keep the later record and record a warning on the parsed file.
    #[default]
    Warn,
    /// Fail the parse.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ParseConfig {
    pub duplicate_keys: DuplicateKeyPolicy,
}

impl ParseConfig {
    pub fn strict() -> Self {
        Self {
            duplicate_keys: DuplicateKeyPolicy::Reject,
        }
    }

    pub fn permissive() -> Self {
        Self {
            duplicate_keys: DuplicateKeyPolicy::Overwrite,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Show axis qualifiers through the aliases stored in parameter 1013.
    pub use_axis_names: bool,
    /// Column label for values from the old dump.
    pub old_label: String,
    /// Column label for values from the new dump.
    pub new_label: String,
    pub freeze_header: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            use_axis_names: false,
            old_label: "OLD".to_string(),
            new_label: "NEW".to_string(),
            freeze_header: true,
        }
    }
}

impl ReportConfig {
    pub fn builder() -> ReportConfigBuilder {
        ReportConfigBuilder {
            inner: ReportConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_non_empty(&self.old_label, "old_label")?;
        ensure_non_empty(&self.new_label, "new_label")?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("[PRM_REPORT_002] {field} must not be empty")]
    EmptyLabel { field: &'static str },
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::EmptyLabel { .. } => error_codes::REPORT_CONFIG,
        }
    }
}

fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyLabel { field });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ReportConfigBuilder {
    inner: ReportConfig,
}

impl Default for ReportConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportConfigBuilder {
    pub fn new() -> Self {
        ReportConfig::builder()
    }

    pub fn use_axis_names(mut self, value: bool) -> Self {
        self.inner.use_axis_names = value;
        self
    }

    pub fn old_label(mut self, value: impl Into<String>) -> Self {
        self.inner.old_label = value.into();
        self
    }

    pub fn new_label(mut self, value: impl Into<String>) -> Self {
        self.inner.new_label = value.into();
        self
    }

    pub fn freeze_header(mut self, value: bool) -> Self {
        self.inner.freeze_header = value;
        self
    }

    pub fn build(self) -> Result<ReportConfig, ConfigError> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}
