//! CLI entry point for the vier catalog browser.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use vier_core::config::{LoadedConfig, load_default_file_config};
use vier_core::{FileConfig, Settings};

mod cli;
mod commands;

use cli::{Args, AuthCommand, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    match &args.command {
        Command::Auth { command } => match command {
            AuthCommand::Login => commands::run_auth_login_command(),
            AuthCommand::Clear => commands::run_auth_clear_command(),
        },
        Command::List { url, pages } => {
            let settings = resolve_settings(&args)?;
            commands::run_list_command(settings, url.as_deref(), *pages).await
        }
        Command::Resolve { url } => {
            let settings = resolve_settings(&args)?;
            commands::run_resolve_command(settings, url).await
        }
    }
}

/// Layers defaults, the config file and command-line overrides.
fn resolve_settings(args: &Args) -> Result<Settings> {
    let loaded = match args.config.as_deref() {
        Some(path) => load_explicit_config(path)?,
        None => load_default_file_config().context("Failed to load config file")?,
    };
    if let Some(path) = &loaded.path {
        debug!(path = %path.display(), found = loaded.config.is_some(), "config file");
    }

    let file = loaded.config.as_ref();
    if let Some(file) = file {
        file.validate().context("Invalid config file")?;
    }

    let mut settings = Settings::from_file(file);
    if let Some(channel) = args.channel {
        settings.channel = channel;
    }
    if let Some(proxy) = &args.proxy {
        settings.proxy = Some(proxy.clone());
    }
    info!(channel = %settings.channel, "vier starting");
    Ok(settings)
}

fn load_explicit_config(path: &Path) -> Result<LoadedConfig> {
    let config = FileConfig::load(path)
        .with_context(|| format!("Failed to load config file '{}'", path.display()))?;
    Ok(LoadedConfig {
        path: Some(path.to_path_buf()),
        config: Some(config),
    })
}
