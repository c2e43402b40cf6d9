use crate::diff::{ChangeRecord, DiffError, DiffReport};
use crate::sink::ChangeSink;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct JsonLinesHeader<'a> {
    kind: &'static str,
    version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    old: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    new: Option<&'a str>,
}

/// Writes one JSON object per change record, preceded by a header line.
pub struct JsonLinesSink<W: Write> {
    w: W,
    old_source: Option<String>,
    new_source: Option<String>,
    wrote_header: bool,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(w: W) -> Self {
        Self {
            w,
            old_source: None,
            new_source: None,
            wrote_header: false,
        }
    }

    pub fn with_sources(mut self, old: Option<String>, new: Option<String>) -> Self {
        self.old_source = old;
        self.new_source = new;
        self
    }

    fn write_line<T: Serialize>(&mut self, value: &T) -> Result<(), DiffError> {
        serde_json::to_writer(&mut self.w, value)
            .map_err(|e| DiffError::SinkError { message: e.to_string() })?;
        self.w
            .write_all(b"\n")
            .map_err(|e| DiffError::SinkError { message: e.to_string() })
    }
}

impl<W: Write> ChangeSink for JsonLinesSink<W> {
    fn begin(&mut self) -> Result<(), DiffError> {
        if self.wrote_header {
            return Ok(());
        }
        let old = self.old_source.clone();
        let new = self.new_source.clone();
        let header = JsonLinesHeader {
            kind: "Header",
            version: DiffReport::SCHEMA_VERSION,
            old: old.as_deref(),
            new: new.as_deref(),
        };
        self.write_line(&header)?;
        self.wrote_header = true;
        Ok(())
    }

    fn emit(&mut self, change: ChangeRecord) -> Result<(), DiffError> {
        self.write_line(&change)
    }

    fn finish(&mut self) -> Result<(), DiffError> {
        self.w
            .flush()
            .map_err(|e| DiffError::SinkError { message: e.to_string() })
    }
}
