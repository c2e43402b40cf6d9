use anyhow::Result;
use prm_diff::{ChangeSink, DiffReport, JsonLinesSink, write_json_pretty};
use std::io::Write;

pub fn write_json_report<W: Write>(w: &mut W, report: &DiffReport) -> Result<()> {
    write_json_pretty(w, report)?;
    Ok(())
}

pub fn write_json_lines<W: Write>(w: &mut W, report: &DiffReport) -> Result<()> {
    let mut sink = JsonLinesSink::new(&mut *w)
        .with_sources(report.old_source.clone(), report.new_source.clone());
    sink.begin()?;
    for change in &report.changes {
        sink.emit(change.clone())?;
    }
    sink.finish()?;
    Ok(())
}
