// Pcheckers — Resolver error types
//
// Both variants signal a calling mistake: resolution is only meaningful on a
// store that loaded and passed its consistency check.

use thiserror::Error;

use crate::store::{ConsistencyError, TableKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("Schema incomplete: table '{0}' not loaded")]
    SchemaIncomplete(TableKind),

    #[error("Store has not passed the consistency check")]
    InconsistentStore,

    #[error(transparent)]
    Malformed(#[from] ConsistencyError),
}
