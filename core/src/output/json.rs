use crate::diff::DiffReport;
use crate::model::ParsedFile;
use serde::Serialize;
use std::io::Write;

pub fn serialize_diff_report(report: &DiffReport) -> serde_json::Result<String> {
    serde_json::to_string(report)
}

pub fn serialize_parsed_file(file: &ParsedFile) -> serde_json::Result<String> {
    serde_json::to_string(file)
}

/// Pretty-print any report value followed by a newline.
pub fn write_json_pretty<W: Write, T: Serialize>(w: &mut W, value: &T) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut *w, value)?;
    w.write_all(b"\n").map_err(serde_json::Error::io)
}
