//! Parser for the ALL.PRM line format.
//!
//! ```text
//! %
//! ;<timestamp>
//! ;<controller model>
//! ;<serial/info>...
//! PARA101()
//! N<number>[T<n>][A<n>][K<n>]P<value>
//! ...
//!
//! %
//! ```
//!
//! The whole text is split into lines up front. The envelope is checked, the
//! header collected, the section marker consumed, and then every line up to
//! (not including) the final two is tokenized. Lines that do not start with
//! `N` are treated as comments; `N` lines that do not fit the grammar abort
//! the parse.

use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::config::{DuplicateKeyPolicy, ParseConfig};
use crate::error_codes;
use crate::model::{Header, Parameter, ParameterStore, ParsedFile};

pub const SENTINEL: &str = "%";
pub const SECTION_MARKER: &str = "PARA101()";
const HEADER_PREFIX: char = ';';
const PARAMETER_PREFIX: char = 'N';

/// Violations of the dump format. All of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FormatError {
    #[error("[PRM_PARSE_001] missing start sentinel: the first line must be '%'")]
    MissingStartSentinel,
    #[error("[PRM_PARSE_002] file too short: expected at least 2 lines, found {lines}")]
    TooShort { lines: usize },
    #[error("[PRM_PARSE_003] missing end sentinel: the last line must be '%'")]
    MissingEndSentinel,
    #[error("[PRM_PARSE_004] expected section marker after header: 'PARA101()' not found at line {line_no}")]
    MissingSectionMarker { line_no: usize },
    #[error("[PRM_PARSE_005] cannot parse parameter line {line_no}: {line}")]
    InvalidParameterLine { line_no: usize, line: String },
    #[error("[PRM_PARSE_006] duplicate parameter key '{key}' at line {line_no}")]
    DuplicateKey { key: String, line_no: usize },
    #[error("[PRM_PARSE_007] number too large on parameter line {line_no}: {line}")]
    NumberOutOfRange { line_no: usize, line: String },
}

impl FormatError {
    pub fn code(&self) -> &'static str {
        match self {
            FormatError::MissingStartSentinel => error_codes::PARSE_MISSING_START_SENTINEL,
            FormatError::TooShort { .. } => error_codes::PARSE_TOO_SHORT,
            FormatError::MissingEndSentinel => error_codes::PARSE_MISSING_END_SENTINEL,
            FormatError::MissingSectionMarker { .. } => {
                error_codes::PARSE_MISSING_SECTION_MARKER
            }
            FormatError::InvalidParameterLine { .. } => {
                error_codes::PARSE_INVALID_PARAMETER_LINE
            }
            FormatError::DuplicateKey { .. } => error_codes::PARSE_DUPLICATE_KEY,
            FormatError::NumberOutOfRange { .. } => error_codes::PARSE_NUMBER_OUT_OF_RANGE,
        }
    }
}

/// Errors from the reader/path entry points.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParseError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("[PRM_IO_001] failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ParseError {
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::Format(err) => err.code(),
            ParseError::Io { .. } => error_codes::PARSE_IO,
        }
    }
}

impl ParsedFile {
    /// Read and parse a dump from disk.
    pub fn open(path: impl AsRef<Path>, config: &ParseConfig) -> Result<ParsedFile, ParseError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = parse_prm_str(&text, Some(path.display().to_string()), config)?;
        Ok(parsed)
    }
}

pub fn parse_prm_reader<R: Read>(
    mut reader: R,
    source: Option<String>,
    config: &ParseConfig,
) -> Result<ParsedFile, ParseError> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|source_err| ParseError::Io {
            path: PathBuf::from(source.as_deref().unwrap_or("<reader>")),
            source: source_err,
        })?;
    Ok(parse_prm_str(&text, source, config)?)
}

pub fn parse_prm_str(
    text: &str,
    source: Option<String>,
    config: &ParseConfig,
) -> Result<ParsedFile, FormatError> {
    let lines = split_lines(text);

    validate_envelope(&lines)?;
    let (header, marker_idx) = extract_header(&lines);
    debug!(
        source = source.as_deref().unwrap_or("<memory>"),
        header_lines = header.lines.len(),
        "parsed header"
    );
    let data_start = expect_section_marker(&lines, marker_idx)?;

    let mut parsed = ParsedFile::new(header, ParameterStore::new(), source);
    parse_parameters(&lines, data_start, config, &mut parsed)?;

    debug!(
        source = parsed.source.as_deref().unwrap_or("<memory>"),
        parameters = parsed.parameters.len(),
        warnings = parsed.warnings.len(),
        "parsed parameters"
    );
    Ok(parsed)
}

fn split_lines(text: &str) -> Vec<&str> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.lines()
        .map(|line| line.trim_end_matches('\r'))
        .collect()
}

/// Check the `%` sentinels and the minimum length.
pub fn validate_envelope(lines: &[&str]) -> Result<(), FormatError> {
    if lines.first() != Some(&SENTINEL) {
        return Err(FormatError::MissingStartSentinel);
    }
    if lines.len() < 2 {
        return Err(FormatError::TooShort { lines: lines.len() });
    }
    if lines.last() != Some(&SENTINEL) {
        return Err(FormatError::MissingEndSentinel);
    }
    Ok(())
}

/// Collect consecutive `;` lines after the start sentinel.
///
/// Returns the header and the index of the first line that is not part of it.
pub fn extract_header(lines: &[&str]) -> (Header, usize) {
    let mut idx = 1;
    let mut collected = Vec::new();
    while let Some(rest) = lines.get(idx).and_then(|line| line.strip_prefix(HEADER_PREFIX)) {
        collected.push(rest.to_string());
        idx += 1;
    }
    (Header::new(collected), idx)
}

/// Consume the `PARA101()` line at `idx`, returning the index after it.
pub fn expect_section_marker(lines: &[&str], idx: usize) -> Result<usize, FormatError> {
    match lines.get(idx) {
        Some(&line) if line == SECTION_MARKER => Ok(idx + 1),
        _ => Err(FormatError::MissingSectionMarker { line_no: idx + 1 }),
    }
}

fn parse_parameters(
    lines: &[&str],
    start: usize,
    config: &ParseConfig,
    parsed: &mut ParsedFile,
) -> Result<(), FormatError> {
    // The last two lines (blank terminator and '%') are never data.
    let end = lines.len().saturating_sub(2);

    for (idx, line) in lines.iter().enumerate().take(end).skip(start) {
        let line_no = idx + 1;
        if line.is_empty() || !line.starts_with(PARAMETER_PREFIX) {
            continue;
        }

        let parameter = tokenize_parameter_line(line).map_err(|fault| match fault {
            LineFault::Grammar => FormatError::InvalidParameterLine {
                line_no,
                line: line.to_string(),
            },
            LineFault::Overflow => FormatError::NumberOutOfRange {
                line_no,
                line: line.to_string(),
            },
        })?;

        let key = parameter.key();
        if parsed.parameters.contains_key(&key) {
            match config.duplicate_keys {
                DuplicateKeyPolicy::Overwrite => {}
                DuplicateKeyPolicy::Warn => {
                    debug!(key = %key, line_no, "duplicate parameter key; keeping the later value");
                    parsed.add_warning(format!(
                        "duplicate parameter key '{key}' at line {line_no}; earlier value overwritten"
                    ));
                }
                DuplicateKeyPolicy::Reject => {
                    return Err(FormatError::DuplicateKey { key, line_no });
                }
            }
        }
        parsed.parameters.insert(parameter);
    }

    Ok(())
}

/// Tokenize one data line.
///
/// Grammar: `N<digits>`, then at most one each of `T<digits>`, `A<digits>`,
/// `K<digits>` in any order, then `P` and the verbatim remainder (possibly
/// empty). Returns `None` when the line does not fit, or when it fits but a
/// digit run does not fit in a `u64`.
pub fn parse_parameter_line(line: &str) -> Option<Parameter> {
    tokenize_parameter_line(line).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineFault {
    Grammar,
    /// The line matches the grammar but a number exceeds `u64::MAX`.
    Overflow,
}

fn tokenize_parameter_line(line: &str) -> Result<Parameter, LineFault> {
    let rest = line
        .strip_prefix(PARAMETER_PREFIX)
        .ok_or(LineFault::Grammar)?;
    let (number, mut rest) = take_number(rest)?;
    let mut overflow = number.is_none();

    let mut axis = None;
    let mut tool = None;
    let mut keep = None;

    loop {
        let mut chars = rest.chars();
        let slot = match chars.next().ok_or(LineFault::Grammar)? {
            'P' => break,
            'A' => &mut axis,
            'T' => &mut tool,
            'K' => &mut keep,
            _ => return Err(LineFault::Grammar),
        };
        if slot.is_some() {
            return Err(LineFault::Grammar);
        }
        let (n, after) = take_number(chars.as_str())?;
        // Keep the slot occupied even on overflow so a repeat is still a
        // grammar failure.
        *slot = Some(n.unwrap_or_default());
        overflow |= n.is_none();
        rest = after;
    }

    if overflow {
        return Err(LineFault::Overflow);
    }
    Ok(Parameter {
        number: number.unwrap_or_default(),
        value: rest['P'.len_utf8()..].to_string(),
        axis,
        tool,
        keep,
    })
}

/// Split off a leading ASCII digit run. The value is `None` when the run is
/// too long for a `u64`.
fn take_number(text: &str) -> Result<(Option<u64>, &str), LineFault> {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    if end == 0 {
        return Err(LineFault::Grammar);
    }
    let (digits, rest) = text.split_at(end);
    Ok((digits.parse::<u64>().ok(), rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ParsedFile, FormatError> {
        parse_prm_str(text, None, &ParseConfig::default())
    }

    fn dump(body: &[&str]) -> String {
        let mut lines = vec!["%", ";2024/05/01 08:00:00", ";M800", "PARA101()"];
        lines.extend_from_slice(body);
        lines.extend_from_slice(&["", "%"]);
        lines.join("\n") + "\n"
    }

    #[test]
    fn tool_qualified_line() {
        let p = parse_parameter_line("N1001T1P1").expect("line should parse");
        assert_eq!(p.number, 1001);
        assert_eq!(p.tool, Some(1));
        assert_eq!(p.axis, None);
        assert_eq!(p.keep, None);
        assert_eq!(p.value, "1");
        assert_eq!(p.key(), "1001_T1");
    }

    #[test]
    fn axis_qualified_line() {
        let p = parse_parameter_line("N2025A4P9000").expect("line should parse");
        assert_eq!(p.axis, Some(4));
        assert_eq!(p.value, "9000");
        assert_eq!(p.key(), "2025_A4");
    }

    #[test]
    fn empty_payload_is_valid() {
        let p = parse_parameter_line("N1P").expect("line should parse");
        assert_eq!(p.value, "");
        assert_eq!(p.key(), "1");
    }

    #[test]
    fn qualifiers_in_any_order_normalize_key() {
        let a = parse_parameter_line("N5K2A1T3P0").expect("parse");
        let b = parse_parameter_line("N5T3K2A1P0").expect("parse");
        assert_eq!(a.key(), "5_A1_T3_K2");
        assert_eq!(a, b);
    }

    #[test]
    fn value_kept_verbatim() {
        let p = parse_parameter_line("N12P -007.50 ").expect("parse");
        assert_eq!(p.value, " -007.50 ");
        let p = parse_parameter_line("N13PP").expect("parse");
        assert_eq!(p.value, "P");
    }

    #[test]
    fn grammar_rejections() {
        for line in [
            "N",
            "NP1",
            "N12",
            "N12X3P1",
            "N12A1A2P1",
            "N12TP1",
            "NOTE: comment",
        ] {
            assert!(parse_parameter_line(line).is_none(), "should reject {line:?}");
        }
    }

    #[test]
    fn numbers_wider_than_u32_are_accepted() {
        let file = parse("%\nPARA101()\nN4294967296P1\nN1T99999999999P2\n\n%\n").expect("parse");
        assert_eq!(file.parameters.len(), 2);
        assert_eq!(
            file.parameters.get("4294967296").map(|p| p.value.as_str()),
            Some("1")
        );
        assert_eq!(
            file.parameters.get("1_T99999999999").and_then(|p| p.tool),
            Some(99_999_999_999)
        );
    }

    #[test]
    fn digit_run_beyond_u64_is_out_of_range() {
        let line = "N1A99999999999999999999P5";
        assert!(parse_parameter_line(line).is_none());

        let err = parse(&dump(&["N1P1", line])).expect_err("should fail");
        assert_eq!(
            err,
            FormatError::NumberOutOfRange {
                line_no: 6,
                line: line.to_string()
            }
        );
        assert_eq!(err.code(), "PRM_PARSE_007");
    }

    #[test]
    fn grammar_failure_wins_over_overflow() {
        let line = "N99999999999999999999999X1P5";
        let err = parse(&dump(&[line])).expect_err("should fail");
        assert_eq!(
            err,
            FormatError::InvalidParameterLine {
                line_no: 5,
                line: line.to_string()
            }
        );
    }

    #[test]
    fn missing_start_sentinel() {
        assert_eq!(parse("N1P1\n\n%\n"), Err(FormatError::MissingStartSentinel));
        assert_eq!(parse(""), Err(FormatError::MissingStartSentinel));
    }

    #[test]
    fn single_sentinel_is_too_short() {
        assert_eq!(parse("%\n"), Err(FormatError::TooShort { lines: 1 }));
    }

    #[test]
    fn missing_end_sentinel() {
        let err = parse("%\nPARA101()\nN1P1\n\n").expect_err("should fail");
        assert_eq!(err, FormatError::MissingEndSentinel);
        assert!(err.to_string().contains("missing end sentinel"));
    }

    #[test]
    fn missing_section_marker() {
        let err = parse("%\n;hdr\nN1P1\n\n%\n").expect_err("should fail");
        assert_eq!(err, FormatError::MissingSectionMarker { line_no: 3 });
        assert!(err.to_string().contains("expected section marker after header"));
    }

    #[test]
    fn header_is_collected_without_prefix() {
        let file = parse(&dump(&["N1P28"])).expect("parse");
        assert_eq!(file.header.timestamp(), Some("2024/05/01 08:00:00"));
        assert_eq!(file.header.controller_model(), Some("M800"));
        assert!(file.header.serials().is_empty());
    }

    #[test]
    fn zero_header_lines_is_valid() {
        let file = parse("%\nPARA101()\nN1P1\n\n%\n").expect("parse");
        assert!(file.header.is_empty());
        assert_eq!(file.parameters.len(), 1);
    }

    #[test]
    fn non_n_and_blank_lines_are_skipped() {
        let file = parse(&dump(&["", "(comment)", "N1P1", "  N2P2", "N3P3"])).expect("parse");
        let keys: Vec<&str> = file.parameters.keys().collect();
        assert_eq!(keys, vec!["1", "3"]);
    }

    #[test]
    fn invalid_n_line_names_offending_line() {
        let err = parse(&dump(&["N1P1", "N2Q5"])).expect_err("should fail");
        assert_eq!(
            err,
            FormatError::InvalidParameterLine {
                line_no: 6,
                line: "N2Q5".to_string()
            }
        );
        assert!(err.to_string().contains("N2Q5"));
    }

    #[test]
    fn last_two_lines_are_excluded_by_position() {
        // The line before the final '%' is a data-looking line; it is not parsed.
        let file = parse("%\nPARA101()\nN1P1\nN2P2\n%\n").expect("parse");
        let keys: Vec<&str> = file.parameters.keys().collect();
        assert_eq!(keys, vec!["1"]);

        // Same position holding garbage is not validated either.
        let file = parse("%\nPARA101()\nN1P1\nNgarbage\n%\n").expect("parse");
        assert_eq!(file.parameters.len(), 1);
    }

    #[test]
    fn marker_directly_before_terminator_yields_empty_store() {
        let file = parse("%\nPARA101()\n%\n").expect("parse");
        assert!(file.parameters.is_empty());
    }

    #[test]
    fn duplicate_key_warns_and_overwrites_by_default() {
        let file = parse(&dump(&["N1A1P5", "N1A1P6"])).expect("parse");
        assert_eq!(file.parameters.len(), 1);
        assert_eq!(file.parameters.get("1_A1").map(|p| p.value.as_str()), Some("6"));
        assert_eq!(file.warnings.len(), 1);
        assert!(file.warnings[0].contains("1_A1"));
    }

    #[test]
    fn duplicate_key_silent_when_overwrite() {
        let file = parse_prm_str(
            &dump(&["N1P5", "N1P6"]),
            None,
            &ParseConfig::permissive(),
        )
        .expect("parse");
        assert!(file.warnings.is_empty());
        assert_eq!(file.parameters.get("1").map(|p| p.value.as_str()), Some("6"));
    }

    #[test]
    fn duplicate_key_rejected_when_strict() {
        let err = parse_prm_str(&dump(&["N1P5", "N1P6"]), None, &ParseConfig::strict())
            .expect_err("should fail");
        assert_eq!(
            err,
            FormatError::DuplicateKey {
                key: "1".to_string(),
                line_no: 6
            }
        );
    }

    #[test]
    fn crlf_and_bom_are_tolerated() {
        let text = "\u{feff}%\r\n;hdr\r\nPARA101()\r\nN7P x\r\n\r\n%\r\n";
        let file = parse(text).expect("parse");
        assert_eq!(file.parameters.get("7").map(|p| p.value.as_str()), Some(" x"));
        assert_eq!(file.header.lines, vec!["hdr".to_string()]);
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(FormatError::MissingStartSentinel.code(), "PRM_PARSE_001");
        assert_eq!(FormatError::MissingEndSentinel.code(), "PRM_PARSE_003");
    }
}
