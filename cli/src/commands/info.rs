use anyhow::{Context, Result};
use prm_diff::{ParameterCategory, ParseConfig, ReportConfig, export_parameters_xlsx};
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use super::{load_descriptions, open_dump};

pub fn run(
    path: &str,
    output: Option<&str>,
    descriptions_path: Option<&str>,
    axis_names: bool,
    limit: usize,
    parse_config: &ParseConfig,
) -> Result<ExitCode> {
    let parsed = open_dump(path, "input", parse_config)?;
    let descriptions = load_descriptions(descriptions_path)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    let filename = Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy())
        .unwrap_or_else(|| path.into());

    writeln!(handle, "Dump: {}", filename)?;
    if let Some(timestamp) = parsed.header.timestamp() {
        writeln!(handle, "Timestamp: {}", timestamp)?;
    }
    if let Some(model) = parsed.header.controller_model() {
        writeln!(handle, "Controller: {}", model)?;
    }
    for serial in parsed.header.serials() {
        writeln!(handle, "Serial: {}", serial)?;
    }

    let counts = ParameterCategory::ALL
        .iter()
        .map(|&category| {
            format!(
                "{} {}",
                parsed.parameters.in_category(category).count(),
                category.as_str().to_lowercase()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(handle, "Parameters: {} ({})", parsed.parameters.len(), counts)?;

    for (idx, param) in parsed.parameters.parameters().take(limit).enumerate() {
        writeln!(handle, "  {}. {} = \"{}\"", idx + 1, param.label(), param.value)?;
    }
    if parsed.parameters.len() > limit {
        writeln!(handle, "  ... {} more", parsed.parameters.len() - limit)?;
    }

    if let Some(output) = output {
        let config = ReportConfig::builder()
            .use_axis_names(axis_names)
            .build()
            .context("Invalid report configuration")?;
        export_parameters_xlsx(&parsed, output, &config, descriptions.as_ref())
            .with_context(|| format!("Failed to write parameter report: {}", output))?;
        writeln!(handle, "Report written to {}", output)?;
    }

    Ok(ExitCode::from(0))
}
