//! Structural comparison of two parameter stores.
//!
//! - [`ChangeKind`] / [`ChangeRecord`]: one classified difference
//! - [`DiffReport`]: the versioned result of comparing two parsed files
//! - [`DiffError`]: failures raised by sinks consuming the change stream
//!
//! Keys are visited in lexicographic order of the composite key string, so
//! the output never depends on the file order of either input.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error_codes;
use crate::model::{Parameter, ParameterStore, ParsedFile};
use crate::sink::ChangeSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeKind::Added => "Added",
            ChangeKind::Removed => "Removed",
            ChangeKind::Modified => "Modified",
        }
    }
}

/// One changed parameter.
///
/// `parameter` is the record from the new side for `Added`/`Modified` and
/// from the old side for `Removed`. `prior_value` is only set for `Modified`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub kind: ChangeKind,
    pub parameter: Parameter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_value: Option<String>,
}

impl ChangeRecord {
    pub fn added(parameter: Parameter) -> Self {
        Self {
            kind: ChangeKind::Added,
            parameter,
            prior_value: None,
        }
    }

    pub fn removed(parameter: Parameter) -> Self {
        Self {
            kind: ChangeKind::Removed,
            parameter,
            prior_value: None,
        }
    }

    pub fn modified(parameter: Parameter, prior_value: String) -> Self {
        debug_assert_ne!(parameter.value, prior_value, "modified record must change the value");
        Self {
            kind: ChangeKind::Modified,
            parameter,
            prior_value: Some(prior_value),
        }
    }

    pub fn key(&self) -> String {
        self.parameter.key()
    }

    /// Value on the old side, if the parameter existed there.
    pub fn old_value(&self) -> Option<&str> {
        match self.kind {
            ChangeKind::Added => None,
            ChangeKind::Removed => Some(&self.parameter.value),
            ChangeKind::Modified => self.prior_value.as_deref(),
        }
    }

    /// Value on the new side, if the parameter exists there.
    pub fn new_value(&self) -> Option<&str> {
        match self.kind {
            ChangeKind::Removed => None,
            ChangeKind::Added | ChangeKind::Modified => Some(&self.parameter.value),
        }
    }
}

/// Errors produced while streaming changes into a sink.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiffError {
    #[error("[PRM_DIFF_001] sink error: {message}. Suggestion: check the output destination and retry.")]
    SinkError { message: String },
}

impl DiffError {
    pub fn code(&self) -> &'static str {
        match self {
            DiffError::SinkError { .. } => error_codes::DIFF_SINK_ERROR,
        }
    }
}

/// Per-kind counts of an emitted change stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
}

impl DiffSummary {
    pub fn record(&mut self, kind: ChangeKind) {
        match kind {
            ChangeKind::Added => self.added += 1,
            ChangeKind::Removed => self.removed += 1,
            ChangeKind::Modified => self.modified += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.added + self.removed + self.modified
    }

    pub fn from_changes(changes: &[ChangeRecord]) -> Self {
        let mut summary = DiffSummary::default();
        for change in changes {
            summary.record(change.kind);
        }
        summary
    }
}

/// Changed keys of `old` vs `new`, in key order. Unchanged parameters are
/// skipped.
fn changes<'a>(
    old: &'a ParameterStore,
    new: &'a ParameterStore,
) -> impl Iterator<Item = ChangeRecord> + 'a {
    let keys: BTreeSet<&str> = old.keys().chain(new.keys()).collect();
    keys.into_iter()
        .filter_map(move |key| match (old.get(key), new.get(key)) {
            (None, Some(added)) => Some(ChangeRecord::added(added.clone())),
            (Some(removed), None) => Some(ChangeRecord::removed(removed.clone())),
            (Some(before), Some(after)) if before.value != after.value => Some(
                ChangeRecord::modified(after.clone(), before.value.clone()),
            ),
            _ => None,
        })
}

/// Classify every key present in either store and emit changed ones to `sink`
/// in key order. Unchanged parameters are never emitted.
pub fn diff_stores_streaming<S: ChangeSink>(
    old: &ParameterStore,
    new: &ParameterStore,
    sink: &mut S,
) -> Result<DiffSummary, DiffError> {
    let mut summary = DiffSummary::default();

    sink.begin()?;
    for record in changes(old, new) {
        summary.record(record.kind);
        sink.emit(record)?;
    }
    sink.finish()?;

    debug!(
        added = summary.added,
        removed = summary.removed,
        modified = summary.modified,
        "diffed parameter stores"
    );
    Ok(summary)
}

pub fn diff_stores(old: &ParameterStore, new: &ParameterStore) -> Vec<ChangeRecord> {
    changes(old, new).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffReport {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_source: Option<String>,
    pub changes: Vec<ChangeRecord>,
    pub summary: DiffSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl DiffReport {
    pub const SCHEMA_VERSION: &'static str = "1";

    pub fn new(changes: Vec<ChangeRecord>) -> DiffReport {
        DiffReport {
            version: Self::SCHEMA_VERSION.to_string(),
            old_source: None,
            new_source: None,
            summary: DiffSummary::from_changes(&changes),
            changes,
            warnings: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changes_of(&self, kind: ChangeKind) -> impl Iterator<Item = &ChangeRecord> {
        self.changes.iter().filter(move |change| change.kind == kind)
    }
}

impl ParsedFile {
    /// Compare `self` (old) against `other` (new).
    ///
    /// Parse warnings from both sides are carried into the report, prefixed
    /// with the side they came from.
    pub fn diff(&self, other: &ParsedFile) -> DiffReport {
        let mut report = DiffReport::new(diff_stores(&self.parameters, &other.parameters));
        report.old_source = self.source.clone();
        report.new_source = other.source.clone();
        report
            .warnings
            .extend(self.warnings.iter().map(|w| format!("old: {w}")));
        report
            .warnings
            .extend(other.warnings.iter().map(|w| format!("new: {w}")));
        report
    }

    pub fn diff_streaming<S: ChangeSink>(
        &self,
        other: &ParsedFile,
        sink: &mut S,
    ) -> Result<DiffSummary, DiffError> {
        diff_stores_streaming(&self.parameters, &other.parameters, sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Header;
    use crate::sink::VecSink;

    fn store(entries: &[Parameter]) -> ParameterStore {
        entries.iter().cloned().collect()
    }

    #[test]
    fn modified_value_reports_prior_and_new() {
        let old = store(&[Parameter::new(1, "5").with_axis(1)]);
        let new = store(&[Parameter::new(1, "6").with_axis(1)]);

        let changes = diff_stores(&old, &new);
        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.kind, ChangeKind::Modified);
        assert_eq!(change.key(), "1_A1");
        assert_eq!(change.old_value(), Some("5"));
        assert_eq!(change.new_value(), Some("6"));
    }

    #[test]
    fn added_and_removed_have_one_side() {
        let empty = ParameterStore::new();
        let with_two = store(&[Parameter::new(2, "x")]);
        let with_three = store(&[Parameter::new(3, "y")]);

        let added = diff_stores(&empty, &with_two);
        assert_eq!(added, vec![ChangeRecord::added(Parameter::new(2, "x"))]);
        assert_eq!(added[0].old_value(), None);

        let removed = diff_stores(&with_three, &empty);
        assert_eq!(removed, vec![ChangeRecord::removed(Parameter::new(3, "y"))]);
        assert_eq!(removed[0].new_value(), None);
        assert_eq!(removed[0].old_value(), Some("y"));
    }

    #[test]
    fn unchanged_keys_are_not_reported() {
        let old = store(&[Parameter::new(1, "a"), Parameter::new(2, "b")]);
        let new = store(&[Parameter::new(2, "b"), Parameter::new(1, "a")]);
        assert!(diff_stores(&old, &new).is_empty());
    }

    #[test]
    fn output_is_sorted_by_key_string() {
        let old = store(&[Parameter::new(9, "0"), Parameter::new(100, "0")]);
        let new = store(&[
            Parameter::new(20, "1"),
            Parameter::new(100, "1"),
            Parameter::new(1, "1").with_tool(2),
        ]);

        let keys: Vec<String> = diff_stores(&old, &new).iter().map(|c| c.key()).collect();
        // Lexicographic, not numeric.
        assert_eq!(keys, vec!["100", "1_T2", "20", "9"]);
    }

    #[test]
    fn value_comparison_is_exact_string_equality() {
        let old = store(&[Parameter::new(1, "1.0")]);
        let new = store(&[Parameter::new(1, "1")]);
        let changes = diff_stores(&old, &new);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Modified);
    }

    #[test]
    fn qualifier_change_is_remove_plus_add() {
        let old = store(&[Parameter::new(7, "v").with_axis(1)]);
        let new = store(&[Parameter::new(7, "v").with_axis(2)]);
        let kinds: Vec<ChangeKind> = diff_stores(&old, &new).iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ChangeKind::Removed, ChangeKind::Added]);
    }

    #[test]
    fn report_carries_summary_and_sources() {
        let old = ParsedFile::new(
            Default::default(),
            store(&[Parameter::new(1, "a"), Parameter::new(2, "b")]),
            Some("old.prm".to_string()),
        );
        let mut new = ParsedFile::new(
            Default::default(),
            store(&[Parameter::new(2, "c"), Parameter::new(3, "d")]),
            Some("new.prm".to_string()),
        );
        new.add_warning("duplicate parameter key '3'".to_string());

        let report = old.diff(&new);
        assert_eq!(report.version, DiffReport::SCHEMA_VERSION);
        assert_eq!(report.old_source.as_deref(), Some("old.prm"));
        assert_eq!(report.new_source.as_deref(), Some("new.prm"));
        assert_eq!(
            report.summary,
            DiffSummary {
                added: 1,
                removed: 1,
                modified: 1
            }
        );
        assert_eq!(report.summary.total(), 3);
        assert_eq!(report.warnings, vec!["new: duplicate parameter key '3'".to_string()]);
        assert_eq!(report.changes_of(ChangeKind::Modified).count(), 1);
    }

    #[test]
    fn sink_error_code() {
        let err = DiffError::SinkError {
            message: "disk full".to_string(),
        };
        assert_eq!(err.code(), "PRM_DIFF_001");
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn streaming_and_collected_diffs_agree() {
        let old = ParsedFile::new(
            Header::default(),
            store(&[Parameter::new(3, "a"), Parameter::new(1, "x").with_tool(2)]),
            None,
        );
        let new = ParsedFile::new(
            Header::default(),
            store(&[Parameter::new(1, "y").with_tool(2), Parameter::new(7, "b")]),
            None,
        );

        let mut sink = VecSink::new();
        let summary = old.diff_streaming(&new, &mut sink).expect("VecSink accepts everything");
        let streamed = sink.into_changes();

        assert_eq!(streamed, diff_stores(&old.parameters, &new.parameters));
        assert_eq!(summary, DiffSummary::from_changes(&streamed));
        assert_eq!(summary.total(), 3);
    }
}
