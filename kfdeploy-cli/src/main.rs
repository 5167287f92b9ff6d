//! kfdeploy CLI
//!
//! Deploys compiled pipelines to a Kubeflow Pipelines service, starts runs
//! of them and waits for those runs to finish.
//!
//! Architecture:
//! - Configuration: cluster contexts from a TOML file, overridden by flags
//! - Services: deployer, runner and waiter, each taking an explicit session
//! - Commands: `deploy`, `wait` and `inspect`, mapping outcomes to exit codes
//!
//! Logs go to stderr; stdout carries only command output.

mod commands;
mod config;
mod service;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kfdeploy")]
#[command(about = "Kubeflow pipeline deploy, run and wait CLI", long_about = None)]
struct Cli {
    /// Config file with cluster contexts (default: ./kfdeploy.toml if present)
    #[arg(long, env = "KFDEPLOY_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kfdeploy=info,kfdeploy_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    handle_command(cli.command, &config).await
}
