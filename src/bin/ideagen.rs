//! ideagen CLI Binary
//!
//! Reads a brief, runs one generation flow and prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use ideagen::cli::{map_error, Cli, RunContext};
use ideagen::config::ConfigLoader;
use ideagen::logging::{init_logging, LoggingConfig};
use std::io::Read;
use std::process;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging_config = build_logging_config(&cli);
    init_logging(Some(&logging_config)).context("failed to initialize logging")?;

    info!("ideagen starting");

    let brief = read_brief(&cli)?;

    let context = match RunContext::new(cli.workspace.clone(), cli.config.clone(), cli.format) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(&cli.command, &brief).await {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    }
}

/// The brief file if given, otherwise all of stdin.
fn read_brief(cli: &Cli) -> Result<String> {
    match cli.brief {
        Some(ref path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read brief from {}", path.display())),
        None => {
            let mut brief = String::new();
            std::io::stdin()
                .read_to_string(&mut brief)
                .context("failed to read brief from stdin")?;
            Ok(brief)
        }
    }
}

/// Logging config from the config file, overridden by CLI arguments
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    let mut config = if let Some(ref config_path) = cli.config {
        ConfigLoader::load_from_file(config_path)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    } else {
        ConfigLoader::load(&cli.workspace)
            .ok()
            .map(|c| c.logging)
            .unwrap_or_default()
    };

    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }

    config
}
