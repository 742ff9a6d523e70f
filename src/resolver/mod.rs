// Pcheckers — Resolver Module
//
// Turns a loose user filter into (title, username, password) triples taken
// from a consistent credential store.

mod error;
mod models;
mod resolve;

pub use error::ResolutionError;
pub use models::{PasswordExposure, Resolution, ResolveOptions, ResolvedCredential};
pub use resolve::{resolve, title_matches, MISSING_PASSWORD_MARKER, SEPARATORS, SUBSTRING_MARKER};
