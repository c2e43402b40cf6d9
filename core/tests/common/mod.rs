//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use prm_diff::{ParseConfig, ParsedFile, parse_prm_str};
use std::path::PathBuf;

pub fn fixture_path(filename: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("../fixtures");
    path.push(filename);
    path
}

pub fn prm_fixture_path(filename: &str) -> PathBuf {
    fixture_path(&format!("prm/{filename}"))
}

pub fn open_fixture(name: &str) -> ParsedFile {
    let path = prm_fixture_path(name);
    ParsedFile::open(&path, &ParseConfig::default()).unwrap_or_else(|e| {
        panic!("failed to parse fixture {}: {e}", path.display());
    })
}

/// Wrap data lines in a minimal valid envelope.
pub fn dump_text(body: &[&str]) -> String {
    let mut lines = vec!["%", ";2024/01/01 00:00:00", ";M800", "PARA101()"];
    lines.extend_from_slice(body);
    lines.extend_from_slice(&["", "%"]);
    lines.join("\n") + "\n"
}

pub fn parse_body(body: &[&str]) -> ParsedFile {
    parse_prm_str(&dump_text(body), None, &ParseConfig::default())
        .unwrap_or_else(|e| panic!("failed to parse body {body:?}: {e}"))
}

/// Read one part of an xlsx package as text.
pub fn read_xlsx_part(path: &std::path::Path, part: &str) -> String {
    use std::io::Read;

    let file = std::fs::File::open(path).expect("open xlsx");
    let mut archive = zip::ZipArchive::new(file).expect("xlsx is a zip package");
    let mut entry = archive
        .by_name(part)
        .unwrap_or_else(|e| panic!("missing part {part}: {e}"));
    let mut text = String::new();
    entry.read_to_string(&mut text).expect("read part");
    text
}
