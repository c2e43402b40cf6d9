pub mod diff;
pub mod info;

use anyhow::{Context, Result};
use prm_diff::{Descriptions, ParseConfig, ParsedFile};
use std::path::Path;

pub fn open_dump(path: &str, role: &str, config: &ParseConfig) -> Result<ParsedFile> {
    let parsed = ParsedFile::open(path, config)
        .with_context(|| format!("Failed to parse {} dump: {}", role, path))?;
    for warning in &parsed.warnings {
        eprintln!("Warning: {}: {}", path, warning);
    }
    Ok(parsed)
}

/// A missing lookup file is not fatal: reports are written without
/// descriptions. A file that exists but does not validate is.
pub fn load_descriptions(path: Option<&str>) -> Result<Option<Descriptions>> {
    let Some(path) = path else {
        return Ok(None);
    };
    if !Path::new(path).exists() {
        eprintln!(
            "Info: descriptions file not found: {}; continuing without descriptions",
            path
        );
        return Ok(None);
    }
    let descriptions = Descriptions::load(path)
        .with_context(|| format!("Failed to load descriptions: {}", path))?;
    tracing::debug!(path, entries = descriptions.len(), "loaded descriptions");
    Ok(Some(descriptions))
}

/// Column label for a dump: its file name without extension.
pub fn file_label(path: &str, fallback: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
