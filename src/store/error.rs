// Pcheckers — Store error types

use std::path::PathBuf;

use thiserror::Error;

use super::TableKind;
use crate::table::FormatError;

/// Failure while building the store from a directory. Loading is
/// all-or-nothing: the first failing table aborts the load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Table '{kind}' not found: {}", path.display())]
    MissingTable { kind: TableKind, path: PathBuf },

    #[error("Table '{kind}' ({}): {source}", path.display())]
    TableFailed {
        kind: TableKind,
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("Inconsistent tables: {0}")]
    Inconsistent(#[from] ConsistencyError),
}

/// Cross-table integrity violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    #[error("Missing core table: {0}")]
    MissingCoreTable(TableKind),

    #[error("Account '{title}' must hold exactly 'user=pass', got '{value}'")]
    MalformedAccount { title: String, value: String },

    #[error("{table}: field key '{key}' not in '{target}'{}", hint_suffix(.hint))]
    DanglingReference {
        table: TableKind,
        key: String,
        target: TableKind,
        hint: Option<String>,
    },

    #[error("rank: '{key}' has no 0..9 digit: '{value}'")]
    BadRank { key: String, value: String },

    #[error("{table}: value of '{key}' must not contain '{ch}'")]
    ForbiddenValueChar {
        table: TableKind,
        key: String,
        ch: char,
    },
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref().map(|h| format!(" ({h})")).unwrap_or_default()
}
