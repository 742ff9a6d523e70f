// Pcheckers — Library root
//
// Re-exports the table, store, resolver, config, replica and CLI modules.

pub mod cli;
pub mod config;
pub mod error;
pub mod replica;
pub mod resolver;
pub mod store;
pub mod table;

pub use error::{PcheckersError, Result};
