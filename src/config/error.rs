// Pcheckers — Configuration error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot determine the home directory")]
    NoHome,

    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Duplicate statement: {0}")]
    DuplicateFlag(String),

    #[error("Cannot append to flag: {0}")]
    FlagAppend(String),

    #[error("Unknown var in {name}: {value}")]
    UnknownVariable { name: String, value: String },

    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
