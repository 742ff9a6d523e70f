// Pcheckers — Store Module
//
// The credential schema as a set of keyed text tables read from one
// directory, with the cross-table reference checks that make it usable.

mod error;
mod kind;
mod models;
mod repository;

pub use error::{ConsistencyError, LoadError};
pub use kind::TableKind;
pub use models::{RankEntry, StoreSummary, TableSummary};
pub use repository::{
    split_account, CredentialStore, ACCOUNT_SEPARATOR, NO_CHECK_MARKER, UNKNOWN_USER,
};
