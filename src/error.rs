// Pcheckers — Top-level error types
//
// Aggregates errors from the store, resolver, config and replica modules
// into a single error enum for the application boundary, and maps each to
// the process exit code.

use thiserror::Error;

use crate::config::ConfigError;
use crate::replica::ReplicaError;
use crate::resolver::ResolutionError;
use crate::store::{ConsistencyError, LoadError};

/// Top-level error type for all pcheckers operations.
#[derive(Debug, Error)]
pub enum PcheckersError {
    #[error("Check mi-files failed: {0}")]
    Load(#[from] LoadError),

    #[error("Consistency error: {0}")]
    Consistency(#[from] ConsistencyError),

    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Replica error: {0}")]
    Replica(#[from] ReplicaError),

    #[error("{failed} of {total} table directories failed the check")]
    CheckFailed { failed: usize, total: usize, code: i32 },

    #[error("No 'cred' found, similar to: '{0}'\nUse 'cred ALL' to show all!")]
    NoMatch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl PcheckersError {
    /// Process exit code: 1 table or generic failure, 2 nothing found,
    /// 3 unreadable input, 4 inconsistent tables or missing destination.
    pub fn exit_code(&self) -> i32 {
        match self {
            PcheckersError::Load(LoadError::MissingTable { .. }) => 3,
            PcheckersError::Load(LoadError::TableFailed { source, .. }) if source.is_file_level() => 3,
            PcheckersError::Load(LoadError::TableFailed { .. }) => 1,
            PcheckersError::Load(LoadError::Inconsistent(_)) => 4,
            PcheckersError::Consistency(_) => 4,
            PcheckersError::Config(ConfigError::NotFound(_)) => 2,
            PcheckersError::Replica(ReplicaError::NotADirectory(_)) => 3,
            PcheckersError::Replica(ReplicaError::MissingDestination(_)) => 4,
            PcheckersError::CheckFailed { code, .. } => *code,
            PcheckersError::NoMatch(_) => 2,
            PcheckersError::Resolution(_)
            | PcheckersError::Config(_)
            | PcheckersError::Replica(_)
            | PcheckersError::Io(_)
            | PcheckersError::Other(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, PcheckersError>;

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::store::TableKind;
    use crate::table::FormatError;

    fn table_failed(source: FormatError) -> PcheckersError {
        LoadError::TableFailed {
            kind: TableKind::Users,
            path: PathBuf::from("users.mi"),
            source,
        }
        .into()
    }

    #[test]
    fn test_exit_codes_for_load_failures() {
        assert_eq!(table_failed(FormatError::BadTrailingNewline).exit_code(), 3);
        assert_eq!(table_failed(FormatError::TooShort).exit_code(), 3);
        assert_eq!(table_failed(FormatError::DuplicateKey("a".into())).exit_code(), 1);

        let inconsistent: PcheckersError =
            LoadError::Inconsistent(ConsistencyError::MissingCoreTable(TableKind::Users)).into();
        assert_eq!(inconsistent.exit_code(), 4);
    }

    #[test]
    fn test_exit_codes_for_other_failures() {
        assert_eq!(PcheckersError::NoMatch("x".into()).exit_code(), 2);
        assert_eq!(
            PcheckersError::from(ConfigError::NotFound(PathBuf::from("cfg"))).exit_code(),
            2
        );
        assert_eq!(
            PcheckersError::from(ReplicaError::NotADirectory(PathBuf::from("d"))).exit_code(),
            3
        );
        assert_eq!(
            PcheckersError::from(ReplicaError::MissingDestination(PathBuf::from("d"))).exit_code(),
            4
        );
        assert_eq!(PcheckersError::Other("x".into()).exit_code(), 1);
        let check = PcheckersError::CheckFailed { failed: 1, total: 2, code: 4 };
        assert_eq!(check.exit_code(), 4);
    }

    #[test]
    fn test_message_names_table_and_key() {
        let err = table_failed(FormatError::DuplicateKey("u1".into()));
        let message = err.to_string();
        assert!(message.contains("users"), "{message}");
        assert!(message.contains("Duplicate key: u1"), "{message}");
    }
}
