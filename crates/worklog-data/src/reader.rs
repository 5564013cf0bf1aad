//! Tolerant decoding of exported activity-log CSV text into [`RawRecord`]s.
//!
//! Exports are produced by hand or by spreadsheet tools, so the decoder infers
//! the delimiter and the column layout from the first line and never fails on
//! a malformed row: missing columns become empty strings and unparseable
//! numbers become `0`.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;
use worklog_core::models::RawRecord;

/// Header words that mark the first line as a header row.
const HEADER_MARKERS: &[&str] = &["день", "date", "сотрудник", "часов"];

const DATE_KEYWORDS: &[&str] = &["день", "date"];
const PROJECT_KEYWORDS: &[&str] = &["проект", "project"];
const ACTIVITY_KEYWORDS: &[&str] = &["тип активности", "activity", "тип"];
const EMPLOYEE_KEYWORDS: &[&str] = &["сотрудник", "employee", "name", "фио"];
const ROLE_KEYWORDS: &[&str] = &["должность", "role", "position"];
const PROGRAM_KEYWORDS: &[&str] = &["программа", "program", "app"];
const HOURS_KEYWORDS: &[&str] = &["часов", "hours", "time", "duration"];
const SESSIONS_KEYWORDS: &[&str] = &["сессий", "sessions"];

/// Activity column assumed when a header lacks one.
const DEFAULT_ACTIVITY_COLUMN: usize = 2;

// ── Column mapping ────────────────────────────────────────────────────────────

/// Column index per record field; `None` means the column is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnMap {
    pub date: Option<usize>,
    pub project: Option<usize>,
    pub activity_type: Option<usize>,
    pub employee: Option<usize>,
    pub role: Option<usize>,
    pub program: Option<usize>,
    pub hours: Option<usize>,
    pub sessions: Option<usize>,
}

impl ColumnMap {
    /// Layout of a header-less export.
    pub const POSITIONAL: ColumnMap = ColumnMap {
        date: Some(0),
        project: Some(1),
        activity_type: Some(2),
        employee: Some(3),
        role: Some(4),
        program: Some(5),
        hours: Some(6),
        sessions: Some(7),
    };

    /// Derive a mapping from normalised header names.
    ///
    /// Returns `None` unless both the date and the hours column are found;
    /// callers then use [`ColumnMap::POSITIONAL`] for every field.
    pub fn from_headers(headers: &[String]) -> Option<ColumnMap> {
        let date = find_column(headers, DATE_KEYWORDS)?;
        let hours = find_column(headers, HOURS_KEYWORDS)?;

        Some(ColumnMap {
            date: Some(date),
            project: find_column(headers, PROJECT_KEYWORDS),
            activity_type: Some(
                find_column(headers, ACTIVITY_KEYWORDS).unwrap_or(DEFAULT_ACTIVITY_COLUMN),
            ),
            employee: find_column(headers, EMPLOYEE_KEYWORDS),
            role: find_column(headers, ROLE_KEYWORDS),
            program: find_column(headers, PROGRAM_KEYWORDS),
            hours: Some(hours),
            sessions: find_column(headers, SESSIONS_KEYWORDS),
        })
    }

    /// Build a record from the split fields of one row.
    fn extract(&self, fields: &[String]) -> RawRecord {
        let get = |idx: Option<usize>| field_value(fields, idx);
        RawRecord {
            date: get(self.date),
            project: get(self.project),
            activity_type: get(self.activity_type),
            employee: get(self.employee),
            role: get(self.role),
            program: get(self.program),
            hours: parse_number(&get(self.hours)),
            sessions: parse_number(&get(self.sessions)),
        }
    }
}

/// First header (left to right) containing any of `keywords`.
fn find_column(headers: &[String], keywords: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| keywords.iter().any(|k| h.contains(k)))
}

// ── Layout ────────────────────────────────────────────────────────────────────

/// Where the column mapping came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingSource {
    /// Derived from the header row.
    Derived,
    /// Fixed positional order.
    Positional,
}

/// Layout decisions made from the first line, fixed for the whole input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CsvLayout {
    pub delimiter: char,
    pub has_header: bool,
    pub mapping_source: MappingSource,
    pub columns: ColumnMap,
}

impl Default for CsvLayout {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_header: false,
            mapping_source: MappingSource::Positional,
            columns: ColumnMap::POSITIONAL,
        }
    }
}

impl CsvLayout {
    /// Infer delimiter, header presence and column mapping from `first_line`.
    pub fn infer(first_line: &str) -> Self {
        let delimiter = infer_delimiter(first_line);
        let headers: Vec<String> = first_line
            .split(delimiter)
            .map(normalize_header)
            .collect();

        let has_header = headers
            .iter()
            .any(|h| HEADER_MARKERS.iter().any(|m| h.contains(m)));

        let derived = if has_header {
            ColumnMap::from_headers(&headers)
        } else {
            None
        };

        let (mapping_source, columns) = match derived {
            Some(columns) => (MappingSource::Derived, columns),
            None => (MappingSource::Positional, ColumnMap::POSITIONAL),
        };

        Self {
            delimiter,
            has_header,
            mapping_source,
            columns,
        }
    }
}

/// Semicolon when the line contains one, comma otherwise.
pub fn infer_delimiter(first_line: &str) -> char {
    if first_line.contains(';') {
        ';'
    } else {
        ','
    }
}

fn normalize_header(raw: &str) -> String {
    strip_outer_quotes(raw.trim()).to_lowercase()
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Decoded records plus the layout they were read with.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutcome {
    pub records: Vec<RawRecord>,
    pub layout: CsvLayout,
}

/// Decode `text` into records, in input order.
///
/// Blank rows are skipped. Rows without a usable date are kept here and
/// dropped during aggregation.
pub fn decode(text: &str) -> DecodeOutcome {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text).trim();
    if text.is_empty() {
        return DecodeOutcome {
            records: Vec::new(),
            layout: CsvLayout::default(),
        };
    }

    let lines: Vec<&str> = text.split('\n').collect();
    let layout = CsvLayout::infer(lines[0]);
    debug!(
        "CSV layout: delimiter={:?} header={} mapping={:?}",
        layout.delimiter, layout.has_header, layout.mapping_source
    );

    let start = usize::from(layout.has_header);
    let records: Vec<RawRecord> = lines[start..]
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| layout.columns.extract(&split_row(line, layout.delimiter)))
        .collect();

    debug!("Decoded {} records from {} lines", records.len(), lines.len());
    DecodeOutcome { records, layout }
}

/// Decode `text` and return only the records.
pub fn decode_records(text: &str) -> Vec<RawRecord> {
    decode(text).records
}

// ── Row splitting ─────────────────────────────────────────────────────────────

/// Split one row on `delimiter`.
///
/// Rows containing a quote are re-split with [`split_quoted`]; that result is
/// used only when it has more than one field.
pub fn split_row(line: &str, delimiter: char) -> Vec<String> {
    if line.contains('"') {
        let quoted = split_quoted(line, delimiter);
        if quoted.len() > 1 {
            return quoted;
        }
    }
    line.split(delimiter).map(str::to_string).collect()
}

/// Quote-aware split: a field is either `"..."` (which may contain the
/// delimiter, no escaped quotes) or a run of non-delimiter characters.
///
/// Anything between a closing quote and the next delimiter is discarded.
pub fn split_quoted(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut rest = line;

    loop {
        let quoted = rest
            .strip_prefix('"')
            .and_then(|body| body.find('"').map(|end| (body, end)));

        let (field, remainder) = match quoted {
            Some((body, end)) => {
                let after = &body[end + 1..];
                (&body[..end], after.find(delimiter).map(|i| &after[i..]))
            }
            None => match rest.find(delimiter) {
                Some(i) => (&rest[..i], Some(&rest[i..])),
                None => (rest, None),
            },
        };

        fields.push(field.to_string());
        match remainder {
            Some(r) => rest = &r[delimiter.len_utf8()..],
            None => break,
        }
    }

    fields
}

// ── Field cleaning ────────────────────────────────────────────────────────────

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("regex is valid"))
}

fn non_numeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^0-9.,\-]").expect("regex is valid"))
}

/// Remove one leading and one trailing `"`.
fn strip_outer_quotes(s: &str) -> &str {
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s)
}

/// Cleaned value of the field at `idx`; empty when absent.
fn field_value(fields: &[String], idx: Option<usize>) -> String {
    match idx.and_then(|i| fields.get(i)) {
        Some(raw) => clean_field(raw),
        None => String::new(),
    }
}

/// Trim, strip outer quotes and collapse whitespace runs to one space.
pub fn clean_field(raw: &str) -> String {
    let unquoted = strip_outer_quotes(raw.trim());
    whitespace_run().replace_all(unquoted, " ").into_owned()
}

/// Parse an hour or session count.
///
/// Everything except digits, `.`, `,` and `-` is dropped, the first comma is
/// read as a decimal point and the longest numeric prefix is parsed. Anything
/// unparseable is `0`.
pub fn parse_number(raw: &str) -> f64 {
    if raw.is_empty() {
        return 0.0;
    }
    let stripped = non_numeric().replace_all(raw, "");
    let normalized = stripped.replacen(',', ".", 1);

    let prefix = numeric_prefix(&normalized);
    match prefix.parse::<f64>() {
        Ok(v) if v.is_finite() && v != 0.0 => v,
        _ => 0.0,
    }
}

/// Longest prefix of the form `-?digits(.digits)?` with at least one digit.
fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        let frac_digits = frac_end - frac_start;
        if digits + frac_digits > 0 {
            end = frac_end;
            digits += frac_digits;
        }
    }

    if digits == 0 {
        ""
    } else {
        &s[..end]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
