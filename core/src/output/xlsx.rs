//! Spreadsheet renderers.
//!
//! Two reports are produced:
//! - a parameter report for one dump (`Header` sheet plus one sheet per
//!   parameter view), see [`export_parameters_xlsx`];
//! - a diff report with one color-coded row per change, written through
//!   [`XlsxDiffSink`] so each emitted change maps to exactly one row.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};
use thiserror::Error;

use crate::axis::AxisLabels;
use crate::config::{ConfigError, ReportConfig};
use crate::descriptions::{Descriptions, ParameterDescription};
use crate::diff::{ChangeKind, ChangeRecord, DiffError, DiffSummary};
use crate::error_codes;
use crate::model::{Parameter, ParameterCategory, ParsedFile};
use crate::sink::ChangeSink;

const ADDED_FILL: u32 = 0xC6EFCE;
const REMOVED_FILL: u32 = 0xFFC7CE;
const MAX_EXACT_INTEGER: u64 = 1 << 53;

const PARAMETER_COLUMNS: [&str; 9] = [
    "Parameter",
    "Axis",
    "Tool",
    "Keep",
    "Value",
    "Group",
    "Subgroup",
    "Short Name",
    "Description",
];

pub const DIFF_SHEET: &str = "Diff";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error("[PRM_REPORT_001] XLSX error: {0}")]
    Xlsx(#[from] XlsxError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Diff(#[from] DiffError),
}

impl ReportError {
    pub fn code(&self) -> &'static str {
        match self {
            ReportError::Xlsx(_) => error_codes::REPORT_XLSX,
            ReportError::Config(err) => err.code(),
            ReportError::Diff(err) => err.code(),
        }
    }
}

enum Cell<'a> {
    Number(f64),
    Text(&'a str),
    Label(String),
    Blank,
}

impl<'a> Cell<'a> {
    /// Integers above 2^53 lose precision as `f64`, so they are written as text.
    fn integer(value: u64) -> Self {
        if value <= MAX_EXACT_INTEGER {
            Cell::Number(value as f64)
        } else {
            Cell::Label(value.to_string())
        }
    }

    fn optional_integer(value: Option<u64>) -> Self {
        value.map_or(Cell::Blank, Cell::integer)
    }

    fn text(value: &'a str) -> Self {
        if value.is_empty() {
            Cell::Blank
        } else {
            Cell::Text(value)
        }
    }
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell<'_>,
    format: Option<&Format>,
) -> Result<(), XlsxError> {
    match (cell, format) {
        (Cell::Number(n), None) => {
            sheet.write_number(row, col, *n)?;
        }
        (Cell::Number(n), Some(format)) => {
            sheet.write_number_with_format(row, col, *n, format)?;
        }
        (Cell::Text(s), None) => {
            sheet.write_string(row, col, *s)?;
        }
        (Cell::Text(s), Some(format)) => {
            sheet.write_string_with_format(row, col, *s, format)?;
        }
        (Cell::Label(s), None) => {
            sheet.write_string(row, col, s.as_str())?;
        }
        (Cell::Label(s), Some(format)) => {
            sheet.write_string_with_format(row, col, s.as_str(), format)?;
        }
        (Cell::Blank, None) => {}
        (Cell::Blank, Some(format)) => {
            sheet.write_blank(row, col, format)?;
        }
    }
    Ok(())
}

fn write_row(
    sheet: &mut Worksheet,
    row: u32,
    cells: &[Cell<'_>],
    format: Option<&Format>,
) -> Result<(), XlsxError> {
    for (col, cell) in cells.iter().enumerate() {
        write_cell(sheet, row, col as u16, cell, format)?;
    }
    Ok(())
}

fn write_header_row<S: AsRef<str>>(
    sheet: &mut Worksheet,
    titles: &[S],
    format: &Format,
) -> Result<(), XlsxError> {
    for (col, title) in titles.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, title.as_ref(), format)?;
    }
    Ok(())
}

fn axis_cell(axis: Option<u64>, labels: Option<&AxisLabels>) -> Cell<'static> {
    match (axis, labels) {
        (None, _) => Cell::Blank,
        (Some(axis), Some(labels)) => Cell::Label(labels.label(axis)),
        (Some(axis), None) => Cell::integer(axis),
    }
}

fn description_of(descriptions: Option<&Descriptions>, number: u64) -> Option<&ParameterDescription> {
    descriptions.and_then(|d| d.get(number))
}

/// Write the parameter report for one parsed dump.
pub fn export_parameters_xlsx(
    file: &ParsedFile,
    path: impl AsRef<Path>,
    config: &ReportConfig,
    descriptions: Option<&Descriptions>,
) -> Result<(), ReportError> {
    config.validate()?;
    let axis_labels = config
        .use_axis_names
        .then(|| AxisLabels::from_store(&file.parameters));

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Header")?;
        write_header_row(sheet, &["Field", "Value"], &header_format)?;
        for (idx, line) in file.header.lines.iter().enumerate() {
            let row = idx as u32 + 1;
            sheet.write_string(row, 0, format!("Line {}", idx + 1).as_str())?;
            sheet.write_string(row, 1, line.trim_start_matches(';'))?;
        }
    }

    let ctx = ParameterSheetContext {
        header_format: &header_format,
        axis_labels: axis_labels.as_ref(),
        descriptions,
        freeze_header: config.freeze_header,
    };

    write_parameter_sheet(
        &mut workbook,
        "Parameters.All",
        file.parameters.parameters(),
        &ctx,
    )?;
    for category in ParameterCategory::ALL {
        let name = format!("Parameters.{}", category.as_str());
        write_parameter_sheet(
            &mut workbook,
            &name,
            file.parameters.in_category(category),
            &ctx,
        )?;
    }

    workbook.save(path.as_ref())?;
    Ok(())
}

struct ParameterSheetContext<'a> {
    header_format: &'a Format,
    axis_labels: Option<&'a AxisLabels>,
    descriptions: Option<&'a Descriptions>,
    freeze_header: bool,
}

fn write_parameter_sheet<'p>(
    workbook: &mut Workbook,
    name: &str,
    parameters: impl Iterator<Item = &'p Parameter>,
    ctx: &ParameterSheetContext<'_>,
) -> Result<(), XlsxError> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(name)?;
    write_header_row(sheet, &PARAMETER_COLUMNS, ctx.header_format)?;

    let no_description = ParameterDescription::default();
    for (idx, param) in parameters.enumerate() {
        let desc = description_of(ctx.descriptions, param.number).unwrap_or(&no_description);
        let cells = [
            Cell::integer(param.number),
            axis_cell(param.axis, ctx.axis_labels),
            Cell::optional_integer(param.tool),
            Cell::optional_integer(param.keep),
            Cell::text(&param.value),
            Cell::text(desc.group.as_deref().unwrap_or("")),
            Cell::text(desc.subgroup.as_deref().unwrap_or("")),
            Cell::text(desc.shortname.as_deref().unwrap_or("")),
            Cell::text(desc.description.as_deref().unwrap_or("")),
        ];
        write_row(sheet, idx as u32 + 1, &cells, None)?;
    }

    if ctx.freeze_header {
        sheet.set_freeze_panes(1, 0)?;
    }
    Ok(())
}

struct DiffFormats {
    header: Format,
    added: Format,
    removed: Format,
}

impl DiffFormats {
    fn new() -> Self {
        Self {
            header: Format::new().set_bold(),
            added: Format::new().set_background_color(Color::RGB(ADDED_FILL)),
            removed: Format::new().set_background_color(Color::RGB(REMOVED_FILL)),
        }
    }

    fn for_kind(&self, kind: ChangeKind) -> Option<&Format> {
        match kind {
            ChangeKind::Added => Some(&self.added),
            ChangeKind::Removed => Some(&self.removed),
            ChangeKind::Modified => None,
        }
    }
}

fn sink_error(err: XlsxError) -> DiffError {
    DiffError::SinkError {
        message: err.to_string(),
    }
}

/// Renders a change stream into the `Diff` sheet and saves on `finish`.
pub struct XlsxDiffSink<'a> {
    workbook: Workbook,
    path: PathBuf,
    config: ReportConfig,
    descriptions: Option<&'a Descriptions>,
    axis_labels: Option<AxisLabels>,
    formats: DiffFormats,
    next_row: u32,
}

impl<'a> XlsxDiffSink<'a> {
    /// `axis_labels` is only consulted when `config.use_axis_names` is set.
    pub fn new(
        path: impl Into<PathBuf>,
        config: &ReportConfig,
        descriptions: Option<&'a Descriptions>,
        axis_labels: Option<AxisLabels>,
    ) -> Result<Self, ReportError> {
        config.validate()?;
        let mut workbook = Workbook::new();
        workbook.add_worksheet().set_name(DIFF_SHEET)?;
        Ok(Self {
            workbook,
            path: path.into(),
            config: config.clone(),
            descriptions,
            axis_labels: if config.use_axis_names { axis_labels } else { None },
            formats: DiffFormats::new(),
            next_row: 1,
        })
    }

    pub fn rows_written(&self) -> u32 {
        self.next_row - 1
    }
}

impl ChangeSink for XlsxDiffSink<'_> {
    fn begin(&mut self) -> Result<(), DiffError> {
        let titles = [
            "Parameter".to_string(),
            "Axis".to_string(),
            "Tool".to_string(),
            "Keep".to_string(),
            format!("Value ({})", self.config.old_label),
            format!("Value ({})", self.config.new_label),
            "Changed".to_string(),
            "Description".to_string(),
        ];
        let sheet = self.workbook.worksheet_from_index(0).map_err(sink_error)?;
        write_header_row(sheet, &titles, &self.formats.header).map_err(sink_error)?;
        if self.config.freeze_header {
            sheet.set_freeze_panes(1, 0).map_err(sink_error)?;
        }
        Ok(())
    }

    fn emit(&mut self, change: ChangeRecord) -> Result<(), DiffError> {
        let param = &change.parameter;
        let description = description_of(self.descriptions, param.number)
            .and_then(|d| d.description.as_deref())
            .unwrap_or("");
        let cells = [
            Cell::integer(param.number),
            axis_cell(param.axis, self.axis_labels.as_ref()),
            Cell::optional_integer(param.tool),
            Cell::optional_integer(param.keep),
            change.old_value().map_or(Cell::Blank, Cell::text),
            change.new_value().map_or(Cell::Blank, Cell::text),
            Cell::Text(change.kind.as_str()),
            Cell::text(description),
        ];

        let sheet = self.workbook.worksheet_from_index(0).map_err(sink_error)?;
        write_row(sheet, self.next_row, &cells, self.formats.for_kind(change.kind))
            .map_err(sink_error)?;
        self.next_row += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), DiffError> {
        self.workbook.save(&self.path).map_err(sink_error)
    }
}

/// Diff `old` against `new` straight into a spreadsheet at `path`.
///
/// Axis labels, when enabled, come from the new dump.
pub fn export_diff_xlsx(
    old: &ParsedFile,
    new: &ParsedFile,
    path: impl Into<PathBuf>,
    config: &ReportConfig,
    descriptions: Option<&Descriptions>,
) -> Result<DiffSummary, ReportError> {
    let labels = AxisLabels::from_store(&new.parameters);
    let mut sink = XlsxDiffSink::new(path, config, descriptions, Some(labels))?;
    let summary = old.diff_streaming(new, &mut sink)?;
    Ok(summary)
}

/// Render an already computed change list.
pub fn write_diff_xlsx(
    changes: &[ChangeRecord],
    path: impl Into<PathBuf>,
    config: &ReportConfig,
    descriptions: Option<&Descriptions>,
    axis_labels: Option<AxisLabels>,
) -> Result<(), ReportError> {
    let mut sink = XlsxDiffSink::new(path, config, descriptions, axis_labels)?;
    sink.begin()?;
    for change in changes {
        sink.emit(change.clone())?;
    }
    sink.finish()?;
    Ok(())
}
