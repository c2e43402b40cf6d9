//! PRM Diff: a library for CNC controller parameter dumps (`ALL.PRM`).
//!
//! This crate provides functionality for:
//! - Parsing the line-oriented dump format into a typed [`ParsedFile`]
//! - Computing added/removed/modified changes between two dumps
//! - Rendering a dump or a diff to a spreadsheet, JSON, or JSON Lines
//! - Loading an optional YAML lookup of parameter descriptions
//!
//! # Quick Start
//!
//! ```ignore
//! use prm_diff::{ParseConfig, ParsedFile};
//!
//! let config = ParseConfig::default();
//! let old = ParsedFile::open("old/ALL.PRM", &config)?;
//! let new = ParsedFile::open("new/ALL.PRM", &config)?;
//! let report = old.diff(&new);
//!
//! for change in &report.changes {
//!     println!("{:?} {}", change.kind, change.key());
//! }
//! ```

mod axis;
mod config;
mod descriptions;
mod diff;
mod error_codes;
mod model;
mod output;
mod parser;
mod sink;

pub use axis::{AXIS_NAME_PARAMETER, AxisLabels};
pub use config::{
    ConfigError, DuplicateKeyPolicy, ParseConfig, ReportConfig, ReportConfigBuilder,
};
pub use descriptions::{DescriptionError, Descriptions, ParameterDescription};
pub use diff::{
    ChangeKind, ChangeRecord, DiffError, DiffReport, DiffSummary, diff_stores,
    diff_stores_streaming,
};
pub use model::{Header, Parameter, ParameterCategory, ParameterStore, ParsedFile};
pub use output::json::{serialize_diff_report, serialize_parsed_file, write_json_pretty};
pub use output::json_lines::JsonLinesSink;
#[cfg(feature = "xlsx")]
pub use output::xlsx::{
    DIFF_SHEET, ReportError, XlsxDiffSink, export_diff_xlsx, export_parameters_xlsx,
    write_diff_xlsx,
};
pub use parser::{
    FormatError, ParseError, SECTION_MARKER, SENTINEL, extract_header, expect_section_marker,
    parse_parameter_line, parse_prm_reader, parse_prm_str, validate_envelope,
};
pub use sink::{CallbackSink, ChangeSink, VecSink};
