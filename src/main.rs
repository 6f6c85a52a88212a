//! Cinerag CLI entry point.

use anyhow::Result;
use cinerag::cli::{commands, Cli, Commands};
use cinerag::config::Settings;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(Settings::default_config_path);

    // `config` and `doctor` must work even when the file does not validate.
    let settings = match &cli.command {
        Commands::Config { .. } | Commands::Doctor { .. } => {
            Settings::load_unchecked(&config_path)?
        }
        _ => Settings::load_from(Some(&config_path))?,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| cli.log_filter(&settings.general.log_level)),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match &cli.command {
        Commands::Ask {
            question,
            model,
            top_k,
            sources,
        } => {
            commands::run_ask(question, model.clone(), *top_k, *sources, settings).await?;
        }

        Commands::Search { query, limit } => {
            commands::run_search(query, *limit, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Fetch { force } => {
            std::fs::create_dir_all(settings.data_dir())?;
            commands::run_fetch(*force, settings).await?;
        }

        Commands::Doctor { deep } => {
            commands::run_doctor(&settings, &config_path, *deep)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, config_path, settings)?;
        }
    }

    Ok(())
}
