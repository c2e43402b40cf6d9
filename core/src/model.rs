//! In-memory model of a parsed ALL.PRM dump.
//!
//! - [`Header`]: the `;`-prefixed metadata lines preceding the parameter section
//! - [`Parameter`]: one `N...P...` record with its optional axis/tool/keep qualifiers
//! - [`ParameterStore`]: parameters keyed by composite key, in file order
//! - [`ParsedFile`]: header + store + provenance

use rustc_hash::FxHashMap;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Metadata lines with the leading `;` already removed.
    pub lines: Vec<String>,
}

impl Header {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// First header line: the dump timestamp.
    pub fn timestamp(&self) -> Option<&str> {
        self.lines.first().map(|line| strip_semicolons(line))
    }

    /// Second header line: the controller model identifier.
    pub fn controller_model(&self) -> Option<&str> {
        self.lines.get(1).map(|line| strip_semicolons(line))
    }

    /// Remaining free-form serial/info lines.
    pub fn serials(&self) -> Vec<&str> {
        self.lines
            .iter()
            .skip(2)
            .map(|line| strip_semicolons(line))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn strip_semicolons(line: &str) -> &str {
    line.trim_start_matches(';')
}

/// View a parameter belongs to in the categorized parameter report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterCategory {
    /// No qualifiers at all.
    General,
    Axis,
    Tool,
    Keep,
}

impl ParameterCategory {
    pub const ALL: [ParameterCategory; 4] = [
        ParameterCategory::General,
        ParameterCategory::Axis,
        ParameterCategory::Tool,
        ParameterCategory::Keep,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ParameterCategory::General => "General",
            ParameterCategory::Axis => "Axis",
            ParameterCategory::Tool => "Tool",
            ParameterCategory::Keep => "Keep",
        }
    }
}

/// One controller parameter.
///
/// `value` is the verbatim payload after `P`. It is never coerced, so
/// `"007"`, `"-0.5"` and `""` all survive unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub number: u64,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep: Option<u64>,
}

impl Parameter {
    pub fn new(number: u64, value: impl Into<String>) -> Self {
        Self {
            number,
            value: value.into(),
            axis: None,
            tool: None,
            keep: None,
        }
    }

    pub fn with_axis(mut self, axis: u64) -> Self {
        self.axis = Some(axis);
        self
    }

    pub fn with_tool(mut self, tool: u64) -> Self {
        self.tool = Some(tool);
        self
    }

    pub fn with_keep(mut self, keep: u64) -> Self {
        self.keep = Some(keep);
        self
    }

    /// Composite identity: the number followed by the present qualifiers,
    /// always in A, T, K order and joined with `_` (`"1001_T1"`, `"2025_A4"`).
    pub fn key(&self) -> String {
        let mut key = self.number.to_string();
        if let Some(axis) = self.axis {
            key.push_str(&format!("_A{axis}"));
        }
        if let Some(tool) = self.tool {
            key.push_str(&format!("_T{tool}"));
        }
        if let Some(keep) = self.keep {
            key.push_str(&format!("_K{keep}"));
        }
        key
    }

    /// Display name in controller notation, e.g. `N1001T1` or `N2025A4`.
    pub fn label(&self) -> String {
        let mut label = format!("N{}", self.number);
        if let Some(axis) = self.axis {
            label.push_str(&format!("A{axis}"));
        }
        if let Some(tool) = self.tool {
            label.push_str(&format!("T{tool}"));
        }
        if let Some(keep) = self.keep {
            label.push_str(&format!("K{keep}"));
        }
        label
    }

    pub fn is_general(&self) -> bool {
        self.axis.is_none() && self.tool.is_none() && self.keep.is_none()
    }

    pub fn is_axis(&self) -> bool {
        self.axis.is_some()
    }

    pub fn is_tool(&self) -> bool {
        self.tool.is_some()
    }

    pub fn is_keep(&self) -> bool {
        self.keep.is_some()
    }

    /// Whether this parameter appears in the given report view. A parameter
    /// with several qualifiers shows up in each matching view.
    pub fn in_category(&self, category: ParameterCategory) -> bool {
        match category {
            ParameterCategory::General => self.is_general(),
            ParameterCategory::Axis => self.is_axis(),
            ParameterCategory::Tool => self.is_tool(),
            ParameterCategory::Keep => self.is_keep(),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {:?}", self.label(), self.value)
    }
}

/// Parameters keyed by composite key, iterated in insertion (file) order.
///
/// Keys are unique. Inserting a parameter whose key already exists replaces
/// the earlier record in place, keeping its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterStore {
    entries: Vec<(String, Parameter)>,
    index: FxHashMap<String, usize>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite; returns the replaced record, if any.
    pub fn insert(&mut self, parameter: Parameter) -> Option<Parameter> {
        let key = parameter.key();
        match self.index.get(&key) {
            Some(&slot) => Some(std::mem::replace(&mut self.entries[slot].1, parameter)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, parameter));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Parameter> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.entries.iter().map(|(key, param)| (key.as_str(), param))
    }

    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.entries.iter().map(|(_, param)| param)
    }

    pub fn in_category(&self, category: ParameterCategory) -> impl Iterator<Item = &Parameter> {
        self.parameters()
            .filter(move |param| param.in_category(category))
    }
}

impl FromIterator<Parameter> for ParameterStore {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        let mut store = ParameterStore::new();
        for parameter in iter {
            store.insert(parameter);
        }
        store
    }
}

impl Serialize for ParameterStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.entries.len()))?;
        for (_, parameter) in &self.entries {
            seq.serialize_element(parameter)?;
        }
        seq.end()
    }
}

/// A fully parsed dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedFile {
    pub header: Header,
    pub parameters: ParameterStore,
    /// Where the dump came from; provenance only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Non-fatal anomalies noticed while parsing (duplicate keys).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ParsedFile {
    pub fn new(header: Header, parameters: ParameterStore, source: Option<String>) -> Self {
        Self {
            header,
            parameters,
            source,
            warnings: Vec::new(),
        }
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}
