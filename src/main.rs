// ABOUTME: Entry point for the slotswap CLI application.
// ABOUTME: Parses arguments, configures logging and maps run outcomes to exit codes.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::DeployOptions;
use slotswap::config::{self, Config};
use slotswap::error::Result;
use slotswap::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flag.
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };

    if let Err(e) = run(cli.command, mode).await {
        if !e.is_reported() {
            Output::new(mode).error(&e.to_string());
        }
        std::process::exit(e.exit_code());
    }
}

async fn run(command: Commands, mode: OutputMode) -> Result<()> {
    let output = Output::new(mode);
    let cwd = env::current_dir()?;

    match command {
        Commands::Init {
            service,
            image,
            force,
        } => {
            config::init_config(&cwd, service.as_deref(), image.as_deref(), force)?;
            output.success(&format!("Created {}", config::CONFIG_FILENAME));
            Ok(())
        }
        Commands::Deploy {
            destination,
            image,
            tag,
            yes,
            force,
        } => {
            let config = load_config(&cwd, destination.as_deref())?;
            let options = DeployOptions {
                image,
                tag,
                yes,
                force,
            };
            commands::deploy(config, options, output).await
        }
        Commands::Status { destination } => {
            let config = load_config(&cwd, destination.as_deref())?;
            commands::status(config, output).await
        }
    }
}

fn load_config(cwd: &std::path::Path, destination: Option<&str>) -> Result<Config> {
    let config = Config::discover(cwd)?;
    match destination {
        Some(dest) => config.for_destination(dest),
        None => Ok(config),
    }
}
