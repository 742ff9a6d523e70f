// Pcheckers — Table error types

use thiserror::Error;

/// Structural defect found while reading or indexing a single table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Too short")]
    TooShort,

    #[error("Bad-formatted-text: must end with one newline after non-blank text")]
    BadTrailingNewline,

    #[error("Missing '#' header line")]
    MissingHeader,

    #[error("len(cells) {actual} <> {expected}, line {line}")]
    FieldCountMismatch {
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Untrimmed field, line {line}")]
    Untrimmed { line: usize },

    #[error("Empty key, line {line}")]
    EmptyKey { line: usize },

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Duplicate value: '{0}'")]
    DuplicateValue(String),

    #[error("Invalid char, ASCII {codepoint}d = 0x{codepoint:02x}: {key}")]
    InvalidCharacter { key: String, codepoint: u32 },

    #[error("Previous header {previous:?} mismatches new: {current:?}")]
    HeaderChanged {
        previous: Vec<String>,
        current: Vec<String>,
    },

    #[error("Cannot read {origin}: {reason}")]
    Unreadable { origin: String, reason: String },
}

impl FormatError {
    /// True for defects of the file as a whole (as opposed to its rows).
    pub fn is_file_level(&self) -> bool {
        matches!(
            self,
            FormatError::TooShort | FormatError::BadTrailingNewline | FormatError::Unreadable { .. }
        )
    }
}
