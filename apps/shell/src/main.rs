#![allow(clippy::print_stdout, clippy::print_stderr)]

pub mod handlers;
pub mod models;

use crate::handlers::{demo, stress};
use crate::models::args::{Cli, Commands};

use anyhow::{Context, Result};
use clap::Parser;
use kvo_logger::{LogFormat, Logger, parse_level};
use kvo_observation::{ObservationRegistry, RegistryConfig, load_config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = if cli.json { LogFormat::Json } else { LogFormat::Compact };
    let _logger = Logger::builder()
        .name(env!("CARGO_BIN_NAME"))
        .level(parse_level(&cli.log_level)?)
        .format(format)
        .init()?;

    let config: RegistryConfig = load_config(cli.config.as_deref())
        .context("Failed to load registry configuration")?;
    tracing::debug!(?config, "Registry configured");
    let registry = ObservationRegistry::with_config(config);

    match cli.command {
        Commands::Demo { name, previous } => demo::run_demo(&registry, name, previous)?,
        Commands::Stress { threads, iterations } => {
            stress::run_stress(&registry, threads.into(), iterations.try_into()?)?;
        },
    }

    Ok(())
}
