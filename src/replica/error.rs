// Pcheckers — Replica error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplicaError {
    #[error("Replica is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Could not find destination: {}", .0.display())]
    MissingDestination(PathBuf),

    #[error("Replica I/O on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
