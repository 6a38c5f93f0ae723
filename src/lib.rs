pub mod cli;
pub mod clients;
pub mod config;
pub mod domain;
pub mod services;
pub mod units;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use cli::commands::{
    Session, cmd_days, cmd_delete, cmd_init, cmd_menu, cmd_stats, cmd_status, cmd_traffic,
    cmd_users,
};
use cli::{Cli, Commands};
pub use config::Config;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let (mut config, source) = load_config(cli.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    init_tracing(&config, cli.verbose);
    match &source {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => info!("No config file found, using defaults"),
    }
    debug!(panel = ?config.panel, "Configuration loaded");

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => cmd_menu(&mut config).await,

        Commands::Init => cmd_init(),

        Commands::Stats { scope, json } => {
            let session = Session::connect(&config).await?;
            cmd_stats(&session, &scope.into_scope(), json).await
        }

        Commands::Users {
            status,
            scope,
            json,
        } => {
            let session = Session::connect(&config).await?;
            cmd_users(&session, status.as_deref(), &scope.into_scope(), json).await
        }

        Commands::Traffic {
            direction,
            amount,
            coefficient,
            scope,
        } => {
            let session = Session::connect(&config).await?;
            cmd_traffic(&session, direction, amount, coefficient, &scope.into_scope()).await
        }

        Commands::Days {
            direction,
            days,
            scope,
        } => {
            let session = Session::connect(&config).await?;
            cmd_days(&session, direction, days, &scope.into_scope()).await
        }

        Commands::Delete {
            idle_days,
            status,
            scope,
        } => {
            let session = Session::connect(&config).await?;
            cmd_delete(&session, idle_days, status.as_deref(), &scope.into_scope()).await
        }

        Commands::Status { toggle, scope } => {
            let session = Session::connect(&config).await?;
            cmd_status(&session, toggle, &scope.into_scope()).await
        }
    }
}

/// The config and the file it came from, if any. Logging is not set up yet.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<(Config, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let config = Config::load_from_path(path)
            .with_context(|| format!("Failed to load --config {}", path.display()))?;
        return Ok((config, Some(path.to_path_buf())));
    }

    match Config::locate() {
        Some(path) => Ok((Config::load_from_path(&path)?, Some(path))),
        None => Ok((Config::default(), None)),
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` or the configured level.
fn init_tracing(config: &Config, verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = if verbose {
        "debug"
    } else {
        config.general.log_level.as_str()
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
