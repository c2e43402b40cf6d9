use crate::commands::diff::Verbosity;
use anyhow::Result;
use prm_diff::{ChangeKind, ChangeRecord, Descriptions, DiffReport};
use std::io::Write;

pub fn write_text_report<W: Write>(
    w: &mut W,
    report: &DiffReport,
    old_label: &str,
    new_label: &str,
    descriptions: Option<&Descriptions>,
    verbosity: Verbosity,
) -> Result<()> {
    writeln!(w, "Comparing {} -> {}", old_label, new_label)?;

    if report.is_empty() {
        writeln!(w, "No differences found.")?;
        return Ok(());
    }

    if verbosity != Verbosity::Quiet {
        for change in &report.changes {
            let line = render_change(change);
            let description = descriptions
                .and_then(|d| d.get(change.parameter.number))
                .and_then(|d| d.description.as_deref());
            match description {
                Some(text) => writeln!(w, "  {}  ({})", line, text)?,
                None => writeln!(w, "  {}", line)?,
            }
        }
        writeln!(w)?;
    }

    let summary = &report.summary;
    writeln!(
        w,
        "Summary: {} added, {} removed, {} modified",
        summary.added, summary.removed, summary.modified
    )?;
    Ok(())
}

fn render_change(change: &ChangeRecord) -> String {
    let label = change.parameter.label();
    match change.kind {
        ChangeKind::Added => format!("+ {} = \"{}\"", label, change.parameter.value),
        ChangeKind::Removed => format!("- {} = \"{}\"", label, change.parameter.value),
        ChangeKind::Modified => format!(
            "~ {}: \"{}\" -> \"{}\"",
            label,
            change.old_value().unwrap_or_default(),
            change.parameter.value
        ),
    }
}
