//! Byte-to-text decoding of exported CSV files.
//!
//! Exports come either as UTF-8 or as Windows-1251 (Cyrillic spreadsheet
//! default). UTF-8 is tried first; the Windows-1251 decoding is used when the
//! UTF-8 result looks wrong.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1251};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use worklog_core::error::{Result, WorklogError};

/// Header words at least one of which a correctly decoded export contains.
pub const EXPECTED_HEADER_WORDS: &[&str] = &[
    "День", "Сотрудник", "Проект", "Тип", "Часов", "Date", "Employee", "Project", "Type", "Hours",
];

// ── TextEncoding ──────────────────────────────────────────────────────────────

/// Encodings an export may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "windows-1251")]
    Windows1251,
}

impl TextEncoding {
    /// Canonical label, as accepted by `--encoding`.
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Windows1251 => "windows-1251",
        }
    }

    fn codec(self) -> &'static Encoding {
        match self {
            TextEncoding::Utf8 => UTF_8,
            TextEncoding::Windows1251 => WINDOWS_1251,
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TextEncoding {
    type Err = WorklogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "windows-1251" | "cp1251" | "cp-1251" => Ok(TextEncoding::Windows1251),
            other => Err(WorklogError::UnknownEncoding(other.to_string())),
        }
    }
}

// ── EncodingChoice ────────────────────────────────────────────────────────────

/// Either automatic resolution or a forced encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingChoice {
    #[default]
    Auto,
    Forced(TextEncoding),
}

impl FromStr for EncodingChoice {
    type Err = WorklogError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(EncodingChoice::Auto)
        } else {
            s.parse().map(EncodingChoice::Forced)
        }
    }
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Text produced from a byte buffer, with the encoding that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: TextEncoding,
    /// `true` when UTF-8 was rejected and Windows-1251 used instead.
    pub fell_back: bool,
}

/// Decode `bytes` with `encoding`, replacing invalid sequences with U+FFFD.
///
/// A byte-order mark matching the encoding is removed.
pub fn decode_with(bytes: &[u8], encoding: TextEncoding) -> String {
    let (text, had_errors) = encoding.codec().decode_with_bom_removal(bytes);
    if had_errors {
        debug!("Decoding as {} produced replacement characters", encoding);
    }
    text.into_owned()
}

/// Heuristic failure check on decoded text: no known header word, or a
/// replacement character somewhere.
pub fn looks_misdecoded(text: &str) -> bool {
    let has_header_word = EXPECTED_HEADER_WORDS.iter().any(|w| text.contains(w));
    !has_header_word || text.contains('\u{FFFD}')
}

/// Decode as UTF-8, falling back to Windows-1251 when the result looks wrong.
///
/// A UTF-8 byte-order mark settles the encoding before any heuristic runs.
/// Otherwise the fallback result is used even if it looks wrong too; a
/// header-less export never contains a header word, so it always ends up here.
pub fn resolve(bytes: &[u8]) -> DecodedText {
    let text = decode_with(bytes, TextEncoding::Utf8);
    if has_utf8_bom(bytes) {
        debug!("UTF-8 byte-order mark present, skipping encoding heuristic");
        return DecodedText {
            text,
            encoding: TextEncoding::Utf8,
            fell_back: false,
        };
    }
    if !looks_misdecoded(&text) {
        return DecodedText {
            text,
            encoding: TextEncoding::Utf8,
            fell_back: false,
        };
    }

    warn!("UTF-8 decoding looks wrong (no header keywords or replacement characters), retrying as windows-1251");
    DecodedText {
        text: decode_with(bytes, TextEncoding::Windows1251),
        encoding: TextEncoding::Windows1251,
        fell_back: true,
    }
}

fn has_utf8_bom(bytes: &[u8]) -> bool {
    matches!(Encoding::for_bom(bytes), Some((encoding, _)) if encoding == UTF_8)
}

/// Decode `bytes` according to `choice`.
pub fn decode_bytes(bytes: &[u8], choice: EncodingChoice) -> DecodedText {
    match choice {
        EncodingChoice::Auto => resolve(bytes),
        EncodingChoice::Forced(encoding) => DecodedText {
            text: decode_with(bytes, encoding),
            encoding,
            fell_back: false,
        },
    }
}

/// Read the file at `path` and decode it according to `choice`.
pub fn read_csv_file(path: &Path, choice: EncodingChoice) -> Result<DecodedText> {
    let bytes = std::fs::read(path).map_err(|source| WorklogError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(decode_bytes(&bytes, choice))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
