use crate::OutputFormat;
use crate::output::{json, text};
use anyhow::{Context, Result};
use prm_diff::{AxisLabels, ParseConfig, ReportConfig, write_diff_xlsx};
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use super::{file_label, load_descriptions, open_dump};

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
}

#[allow(clippy::too_many_arguments)]
pub fn run(
    old_path: &str,
    new_path: &str,
    output: &str,
    descriptions_path: Option<&str>,
    axis_names: bool,
    format: OutputFormat,
    quiet: bool,
    parse_config: &ParseConfig,
) -> Result<ExitCode> {
    let verbosity = if quiet {
        Verbosity::Quiet
    } else {
        Verbosity::Normal
    };

    let old = open_dump(old_path, "old", parse_config)?;
    let new = open_dump(new_path, "new", parse_config)?;
    let descriptions = load_descriptions(descriptions_path)?;

    let old_label = file_label(old_path, "OLD");
    let new_label = file_label(new_path, "NEW");
    let config = ReportConfig::builder()
        .use_axis_names(axis_names)
        .old_label(old_label.as_str())
        .new_label(new_label.as_str())
        .build()
        .context("Invalid report configuration")?;

    let report = old.diff(&new);
    tracing::debug!(
        added = report.summary.added,
        removed = report.summary.removed,
        modified = report.summary.modified,
        "computed diff"
    );

    let axis_labels = axis_names.then(|| AxisLabels::from_store(&new.parameters));
    write_diff_xlsx(
        &report.changes,
        output,
        &config,
        descriptions.as_ref(),
        axis_labels,
    )
    .with_context(|| format!("Failed to write diff report: {}", output))?;

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());

    match format {
        OutputFormat::Text => {
            text::write_text_report(
                &mut writer,
                &report,
                &old_label,
                &new_label,
                descriptions.as_ref(),
                verbosity,
            )?;
            writeln!(writer, "Report written to {}", output)?;
        }
        OutputFormat::Json => {
            json::write_json_report(&mut writer, &report)?;
        }
        OutputFormat::Jsonl => {
            json::write_json_lines(&mut writer, &report)?;
        }
    }
    writer.flush()?;

    Ok(ExitCode::from(0))
}
