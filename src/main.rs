//! coursier-cache - Dependency cache orchestration for JVM builds
//!
//! CLI entry point that dispatches to subcommands.

use clap::error::ErrorKind;
use clap::Parser;
use console::style;
use coursier_cache::cli::{Cli, Commands};
use coursier_cache::config::{Config, ConfigManager};
use coursier_cache::error::{CacheError, CacheResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if is_save_invocation() && !is_informational(e.kind()) => {
            // Same policy as a failed save below
            let _ = e.print();
            std::process::exit(0);
        }
        Err(e) => e.exit(),
    };
    let is_save = matches!(cli.command, Commands::Save);

    let result = run(cli).await;
    if is_save {
        // Saving a cache must never fail the build
        if let Err(e) = result {
            report(&e);
        }
        std::process::exit(0);
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn is_save_invocation() -> bool {
    std::env::args().skip(1).any(|arg| arg == "save")
}

fn is_informational(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}

fn report(e: &CacheError) {
    eprintln!("{} {}", style("Error:").red().bold(), e);
    if let Some(hint) = e.hint() {
        eprintln!("{} {}", style("Hint:").yellow(), hint);
    }
}

async fn run(cli: Cli) -> CacheResult<()> {
    let config = load_config(&cli).await?;
    init_logging(cli.verbose, config.general.log_format == "json");
    debug!("Project root: {}", config.general.root.display());

    match cli.command {
        Commands::Restore(args) => coursier_cache::cli::commands::restore(args, &config).await,
        Commands::Save => coursier_cache::cli::commands::save(&config).await,
    }
}

async fn load_config(cli: &Cli) -> CacheResult<Config> {
    let path = cli
        .config_path()
        .or_else(|| ConfigManager::find_local_config(&cli.discovery_root()));

    let mut config = match path {
        Some(path) => ConfigManager::with_path(path).load().await?,
        None => Config::default(),
    };
    cli.apply(&mut config);
    Ok(config)
}

/// Initialize logging: 0 = info, 1 = debug, 2+ = trace
fn init_logging(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("coursier_cache=info"),
        1 => EnvFilter::new("coursier_cache=debug"),
        _ => EnvFilter::new("coursier_cache=trace"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time();
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
