// Pcheckers — Replica Module
//
// Read-only copies of a validated table directory.

mod copy;
mod error;

pub use copy::{replicate, ReplicaCopy};
pub use error::ReplicaError;
