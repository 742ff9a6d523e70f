// Pcheckers — Table Module
//
// Strict flat-text tables: one header line, one record per line, a unique
// primary key and a composite value built from the remaining fields.

mod error;
mod keyed;
mod options;
mod source;

pub use error::FormatError;
pub use keyed::{KeyedTable, HEADER_MARKER};
pub use options::{ReversePolicy, SortPolicy, SplitMode, TableOptions};
