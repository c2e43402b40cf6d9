//! Optional lookup of human-readable parameter descriptions.
//!
//! The lookup is a YAML mapping from parameter number to a record:
//!
//! ```yaml
//! 1001:
//!   group: Base specifications
//!   subgroup: Axis
//!   shortname: SERVO
//!   description: Servo axis configuration
//! "1013":
//!   shortname: axname
//! ```
//!
//! Validation is all-or-nothing: one malformed entry rejects the document.
//! Renderers receive the result explicitly; nothing here is global.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::error_codes;

const STRING_FIELDS: [&str; 4] = ["group", "subgroup", "shortname", "description"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgroup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DescriptionError {
    #[error("[PRM_DESC_001] failed to read descriptions file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("[PRM_DESC_002] invalid YAML in descriptions: {message}")]
    Yaml { message: String },
    #[error("[PRM_DESC_003] descriptions must be a mapping at the top level")]
    NotAMapping,
    #[error("[PRM_DESC_004] invalid parameter number in descriptions: '{key}'. Expected an integer.")]
    InvalidKey { key: String },
    #[error("[PRM_DESC_005] description of parameter {number} must be a mapping")]
    EntryNotAMapping { number: u64 },
    #[error("[PRM_DESC_006] field '{field}' of parameter {number} must be a string or null")]
    FieldNotString { number: u64, field: &'static str },
}

impl DescriptionError {
    pub fn code(&self) -> &'static str {
        match self {
            DescriptionError::Io { .. } => error_codes::DESC_IO,
            DescriptionError::Yaml { .. } => error_codes::DESC_YAML,
            DescriptionError::NotAMapping => error_codes::DESC_NOT_A_MAPPING,
            DescriptionError::InvalidKey { .. } => error_codes::DESC_INVALID_KEY,
            DescriptionError::EntryNotAMapping { .. } => error_codes::DESC_ENTRY_NOT_A_MAPPING,
            DescriptionError::FieldNotString { .. } => error_codes::DESC_FIELD_NOT_STRING,
        }
    }
}

/// Validated descriptions keyed by parameter number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Descriptions {
    entries: BTreeMap<u64, ParameterDescription>,
}

impl Descriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DescriptionError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DescriptionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, DescriptionError> {
        let document: Value = serde_yaml::from_str(text).map_err(|e| DescriptionError::Yaml {
            message: e.to_string(),
        })?;
        Self::from_value(document)
    }

    fn from_value(document: Value) -> Result<Self, DescriptionError> {
        let mapping = match document {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(mapping) => mapping,
            _ => return Err(DescriptionError::NotAMapping),
        };

        let mut entries = BTreeMap::new();
        for (key, value) in &mapping {
            let number = parse_number(key)?;
            let Value::Mapping(fields) = value else {
                return Err(DescriptionError::EntryNotAMapping { number });
            };
            entries.insert(number, parse_entry(number, fields)?);
        }
        Ok(Self { entries })
    }

    pub fn insert(&mut self, number: u64, description: ParameterDescription) {
        self.entries.insert(number, description);
    }

    pub fn get(&self, number: u64) -> Option<&ParameterDescription> {
        self.entries.get(&number)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_number(key: &Value) -> Result<u64, DescriptionError> {
    let parsed = match key {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| DescriptionError::InvalidKey {
        key: render_key(key),
    })
}

fn render_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| format!("{other:?}")),
    }
}

fn parse_entry(number: u64, fields: &Mapping) -> Result<ParameterDescription, DescriptionError> {
    let mut values: [Option<String>; 4] = Default::default();
    for (slot, field) in values.iter_mut().zip(STRING_FIELDS) {
        *slot = match fields.get(field) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => return Err(DescriptionError::FieldNotString { number, field }),
        };
    }
    let [group, subgroup, shortname, description] = values;
    Ok(ParameterDescription {
        group,
        subgroup,
        shortname,
        description,
    })
}
