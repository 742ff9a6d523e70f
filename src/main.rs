// Pcheckers — Application Entry Point
//
// Parses CLI arguments, initializes structured logging on stderr (never
// with secret values), and dispatches to the command handler.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pcheckers::cli::{execute, Cli};

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise -vvv turns on debug logs.
    let default_filter = match cli.verbose {
        0..=2 => "pcheckers=warn",
        _ => "pcheckers=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = execute(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
