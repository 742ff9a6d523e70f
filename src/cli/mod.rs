// Pcheckers — CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: check, cred, config, replica.

mod commands;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

pub use commands::execute;

/// Pcheckers — check and query flat-file credential tables.
#[derive(Parser, Debug)]
#[command(name = "pcheckers")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Verbose output; repeat for more (-v dumps every table, -vv adds ranks
    /// and info text, -vvv debug logs).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Use the current directory instead of the configured `key_abs_path`.
    #[arg(short = 'k', long, global = true)]
    pub key_current_dir: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load, validate and dump the tables of one or more directories.
    Check {
        /// Table directories (default: the configured `key_abs_path`).
        paths: Vec<PathBuf>,

        /// Print the table summary as JSON instead of dumping rows.
        #[arg(long)]
        json: bool,
    },

    /// Show credentials whose title starts with FILTER ("ALL" or nothing shows all).
    /// A leading '@' matches anywhere in the title.
    Cred {
        filter: Option<String>,

        /// Table directory (default: the configured `key_abs_path`).
        #[arg(long)]
        path: Option<PathBuf>,

        /// Show password references instead of passwords.
        #[arg(long)]
        masked: bool,

        /// Do not retry with separators ('.', ' ', '-', '_') replaced by blanks.
        #[arg(long)]
        strict: bool,
    },

    /// Show the configuration path (and, with -v, its settings).
    Config,

    /// Copy the validated tables over DEST and leave them read-only.
    Replica {
        /// Destination directory; must already hold one file per table.
        dest: PathBuf,

        /// Table directory (default: the configured `key_abs_path`).
        path: Option<PathBuf>,
    },
}
