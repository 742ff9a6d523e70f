// Pcheckers — CLI Command Handlers
//
// Each function handles one CLI subcommand. Table directories default to
// the configured `key_abs_path`, or to the current directory with `-k`.

use std::path::{Path, PathBuf};

use crate::config::{ConfigError, Settings, KEY_ABS_PATH};
use crate::error::PcheckersError;
use crate::replica::replicate;
use crate::resolver::{resolve, PasswordExposure, ResolveOptions};
use crate::store::{CredentialStore, TableKind};

use super::{Cli, Commands};

/// Filter word that selects every account.
const ALL_FILTER: &str = "ALL";

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Copy)]
struct Context {
    verbose: u8,
    key_current_dir: bool,
}

/// Execute the parsed CLI command.
pub fn execute(cli: Cli) -> Result<(), PcheckersError> {
    let ctx = Context {
        verbose: cli.verbose,
        key_current_dir: cli.key_current_dir,
    };
    match cli.command {
        Commands::Check { paths, json } => cmd_check(ctx, paths, json),
        Commands::Cred {
            filter,
            path,
            masked,
            strict,
        } => cmd_cred(ctx, filter, path, masked, strict),
        Commands::Config => cmd_config(ctx),
        Commands::Replica { dest, path } => cmd_replica(ctx, dest, path),
    }
}

// ─── Paths ───────────────────────────────────────────────────────────────────

/// Directory used when none is given on the command line.
fn default_dir(key_current_dir: bool, configured: Option<&str>) -> PathBuf {
    if key_current_dir {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }
    match configured {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from("."),
    }
}

fn table_dir(ctx: Context, explicit: Option<PathBuf>) -> Result<PathBuf, PcheckersError> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    if ctx.key_current_dir {
        return Ok(default_dir(true, None));
    }
    let settings = Settings::load()?;
    Ok(default_dir(false, settings.get_str(KEY_ABS_PATH)))
}

fn load_store(dir: &Path) -> Result<CredentialStore, PcheckersError> {
    tracing::debug!(dir = %dir.display(), "Loading tables");
    Ok(CredentialStore::load(dir)?)
}

// ─── Check ───────────────────────────────────────────────────────────────────

fn cmd_check(ctx: Context, paths: Vec<PathBuf>, json: bool) -> Result<(), PcheckersError> {
    let paths = if paths.is_empty() {
        vec![table_dir(ctx, None)?]
    } else {
        paths
    };

    // Every directory is checked; the last one that loads is dumped.
    let mut failed = 0;
    let mut code = 0;
    let mut last = None;
    for path in &paths {
        match load_store(path) {
            Ok(store) => {
                tracing::info!(dir = %path.display(), summary = %store.table_summary(), "Tables consistent");
                last = Some(store);
            }
            Err(e) => {
                failed += 1;
                code = e.exit_code();
                eprintln!("{}: {}; error-code {}", path.display(), e, code);
            }
        }
    }

    if let Some(store) = &last {
        dump_store(ctx, store, json)?;
    }
    if failed > 0 {
        return Err(PcheckersError::CheckFailed {
            failed,
            total: paths.len(),
            code,
        });
    }
    Ok(())
}

fn dump_store(ctx: Context, store: &CredentialStore, json: bool) -> Result<(), PcheckersError> {
    if json {
        let rendered = serde_json::to_string_pretty(&store.table_summary())
            .map_err(|e| PcheckersError::Other(format!("Cannot render summary: {}", e)))?;
        println!("{}", rendered);
        return Ok(());
    }

    for kind in TableKind::ALL {
        let shown = match kind {
            TableKind::PasswordMap | TableKind::Info => ctx.verbose > 0,
            _ => true,
        };
        if !shown || store.table(kind).is_none() {
            continue;
        }
        if ctx.verbose > 0 {
            println!("# {} ({})", kind.title(), kind.file_name());
        }
        for line in store.dump_table(kind)? {
            println!("{}", line);
        }
    }

    if ctx.verbose > 0 {
        println!("{}", store.table_summary());
        for (kind, header) in store.headers() {
            println!("{}: {}", kind, header.join(";"));
        }
    }
    if ctx.verbose >= 2 {
        for (title, entry) in store.ranks() {
            let state = if entry.is_disabled() { " (disabled)" } else { "" };
            println!("## Rank: '{}', {}={}{}", title, entry.level, entry.description, state);
        }
    }
    Ok(())
}

// ─── Cred ────────────────────────────────────────────────────────────────────

/// `None` selects every account.
fn effective_filter(filter: Option<&str>) -> Option<&str> {
    filter.filter(|f| !f.is_empty() && *f != ALL_FILTER)
}

fn cmd_cred(
    ctx: Context,
    filter: Option<String>,
    path: Option<PathBuf>,
    masked: bool,
    strict: bool,
) -> Result<(), PcheckersError> {
    let store = load_store(&table_dir(ctx, path)?)?;
    let filter = effective_filter(filter.as_deref());
    let options = ResolveOptions {
        loosen: !strict,
        exposure: if masked {
            PasswordExposure::Reference
        } else {
            PasswordExposure::Plain
        },
        ..ResolveOptions::default()
    };

    if ctx.verbose > 0 {
        println!("Show credentials, filter: {}", filter.unwrap_or(ALL_FILTER));
    }
    let resolution = resolve(&store, filter, &options)?;

    let info = store.table(TableKind::Info);
    for cred in &resolution.matches {
        if ctx.verbose == 0 {
            println!("{:_<20.19} {} {}", cred.title, cred.username, cred.password());
            continue;
        }
        println!("{}: {} {}", cred.title, cred.username, cred.password());
        if ctx.verbose >= 2 {
            if let Some(text) = info.and_then(|t| t.lookup(&cred.title)) {
                println!("INFO: {}", text);
            }
        }
        println!("--");
    }

    if resolution.is_empty() {
        if ctx.verbose > 0 {
            println!("Tried: {}", resolution.tried().join(", "));
        }
        return Err(PcheckersError::NoMatch(filter.unwrap_or_default().to_string()));
    }
    Ok(())
}

// ─── Config ──────────────────────────────────────────────────────────────────

fn cmd_config(ctx: Context) -> Result<(), PcheckersError> {
    let settings = Settings::load()?;
    println!("Config. path: {}", settings.path().display());
    if !settings.exists() {
        return Err(ConfigError::NotFound(settings.path().to_path_buf()).into());
    }
    if ctx.verbose > 0 {
        print!("{}", settings.render());
    }
    Ok(())
}

// ─── Replica ─────────────────────────────────────────────────────────────────

fn cmd_replica(ctx: Context, dest: PathBuf, path: Option<PathBuf>) -> Result<(), PcheckersError> {
    let store = load_store(&table_dir(ctx, path)?)?;
    println!("Doing replica... {}", dest.display());

    for copy in replicate(&store, &dest)? {
        if ctx.verbose > 0 {
            println!("Copied {} to {}", copy.source.display(), copy.dest.display());
        }
        println!("Access now: {} {}", copy.access, copy.dest.display());
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
