//! zi - Zero Install dependency solver
//!
//! Loads the settings and a catalog of parsed feeds, runs the solver for one
//! interface and reports the selections or what would have to be downloaded.

mod cli;
mod display;
mod error;

use crate::cli::{Cli, Commands, SolveArgs};
use crate::display::OutputRenderer;
use crate::error::CliError;
use clap::Parser;
use std::path::Path;
use std::process;
use tracing::{error, info};
use zi_catalog::{Catalog, CatalogFile, StoreOracle};
use zi_config::Config;
use zi_solver::Selections;
use zi_types::Policy;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if json_mode {
            println!("{}", e.to_json());
        } else {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting zi v{}", env!("CARGO_PKG_VERSION"));

    // Configuration precedence: file (or defaults), environment, CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    let renderer = OutputRenderer::new(cli.global.json);

    match cli.command {
        Commands::Config { name, value } => {
            // settings are edited without environment overrides so they are
            // never written back to the file
            run_config(config, cli.global.config.as_deref(), name, value, renderer).await
        }
        Commands::Select {
            solve,
            previous,
            output,
        } => {
            config.merge_env()?;
            let (catalog, selections) = solve_for(&mut config, &solve).await?;

            let changes = match previous {
                Some(path) => {
                    let old = read_selections(&path).await?;
                    Some(selections.changes_from(&old))
                }
                None => None,
            };
            if let Some(path) = output {
                write_selections(&path, &selections).await?;
            }

            renderer.render_selections(&selections, changes.as_deref(), catalog.oracle())?;
            Ok(())
        }
        Commands::Fetch { solve } => {
            config.merge_env()?;
            let (catalog, selections) = solve_for(&mut config, &solve).await?;

            let plan = zi_solver::derive_fetch_plan(&selections, catalog.oracle());
            renderer.render_fetch_plan(&plan)?;
            Ok(())
        }
    }
}

async fn run_config(
    mut config: Config,
    config_path: Option<&Path>,
    name: Option<String>,
    value: Option<String>,
    renderer: OutputRenderer,
) -> Result<(), CliError> {
    match (name, value) {
        (None, _) => renderer.render_settings(&config.entries())?,
        (Some(name), None) => {
            let value = config.get_value(&name)?;
            renderer.render_value(&name, &value)?;
        }
        (Some(name), Some(value)) => {
            config.set_value(&name, &value)?;
            let path = match config_path {
                Some(path) => path.to_path_buf(),
                None => Config::default_path()?,
            };
            config.save(&path).await?;
            info!(setting = %name, path = %path.display(), "updated setting");
            renderer.render_success_message(&format!("{name} = {}", config.get_value(&name)?))?;
        }
    }
    Ok(())
}

/// Load the catalog and run the solver for the requested interface
async fn solve_for(
    config: &mut Config,
    args: &SolveArgs,
) -> Result<(Catalog, Selections), CliError> {
    if args.uri.trim().is_empty() {
        return Err(CliError::InvalidArguments(
            "interface URI must not be empty".to_string(),
        ));
    }
    let policy = apply_cli_config(config, args);
    let catalog = load_catalog(config, args).await?;
    let selections = zi_solver::solve(&args.uri, args.root_command(), &catalog, &policy)?;
    Ok((catalog, selections))
}

/// Apply CLI overrides (highest precedence) and build the solver policy
fn apply_cli_config(config: &mut Config, args: &SolveArgs) -> Policy {
    if let Some(network_use) = args.network_override() {
        config.network_use = network_use;
    }
    let policy = config.policy();
    if args.prefer_cached {
        policy.with_prefer_cached(true)
    } else {
        policy
    }
}

async fn load_catalog(config: &Config, args: &SolveArgs) -> Result<Catalog, CliError> {
    let path = args
        .catalog
        .clone()
        .unwrap_or_else(|| config.catalog_path());
    let file = CatalogFile::new(&path);
    let document = file.load().await?;

    let stale = file.is_stale(config.freshness.as_duration()).await?;

    let oracle = StoreOracle::new(config.store_roots());
    info!(
        path = %path.display(),
        feeds = document.feeds.len(),
        implementations = document.implementation_count(),
        stale,
        "loaded catalog"
    );
    Ok(document.into_catalog(oracle))
}

async fn read_selections(path: &Path) -> Result<Selections, CliError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::Zi(zi_errors::Error::io_with_path(&e, path)))?;
    Ok(Selections::from_json(&json)?)
}

async fn write_selections(path: &Path, selections: &Selections) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(selections)
        .map_err(|e| zi_errors::Error::internal(format!("cannot serialize selections: {e}")))?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| CliError::Zi(zi_errors::Error::io_with_path(&e, path)))?;
    info!(path = %path.display(), "saved selections");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled: bool) {
    let default_filter = if debug_enabled {
        "debug"
    } else {
        "warn,zi=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    if json_mode {
        // JSON mode: logs go to stderr as JSON so stdout stays parseable
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .init();
    }
}
