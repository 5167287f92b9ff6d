//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod deploy;
mod inspect;
mod wait;

pub use deploy::DeployArgs;
pub use inspect::InspectArgs;
pub use wait::WaitArgs;

use anyhow::Result;
use clap::{Args, Subcommand};
use kfdeploy_client::Session;
use std::process::ExitCode;
use tracing::error;

use crate::config::{Config, Overrides, ResolvedContext};

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Deploy a compiled pipeline and optionally start a run of it
    Deploy(DeployArgs),
    /// Wait for a run to finish and print its final status
    Wait(WaitArgs),
    /// Show what a pipeline package would deploy, without contacting the service
    Inspect(InspectArgs),
}

/// Flags that select and override the cluster context
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Cluster context, a `[contexts.<name>]` entry of the config file
    #[arg(
        short = 'c',
        long,
        visible_alias = "cloud-environment",
        env = "KFDEPLOY_CONTEXT",
        default_value = "default"
    )]
    pub context: String,

    /// Pipelines service endpoint
    #[arg(long, env = "KFDEPLOY_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Login user for the cluster's identity provider
    #[arg(long, env = "KFDEPLOY_USERNAME")]
    pub username: Option<String>,

    /// Login password
    #[arg(long, env = "KFDEPLOY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Target namespace
    #[arg(short = 'n', long)]
    pub namespace: Option<String>,
}

impl ConnectionArgs {
    fn overrides(&self, experiment: Option<String>) -> Overrides {
        Overrides {
            endpoint: self.endpoint.clone(),
            namespace: self.namespace.clone(),
            experiment,
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Returns
/// The process exit code; `Err` is reserved for invalid invocations such as
/// a bad config file
pub async fn handle_command(command: Commands, config: &Config) -> Result<ExitCode> {
    match command {
        Commands::Deploy(args) => deploy::handle_deploy_command(args, config).await,
        Commands::Wait(args) => wait::handle_wait_command(args, config).await,
        Commands::Inspect(args) => inspect::handle_inspect_command(args),
    }
}

/// Open a session for `ctx`, logging the failure
async fn connect(ctx: &ResolvedContext) -> Option<Session> {
    match Session::connect(ctx.connect_params()).await {
        Ok(session) => Some(session),
        Err(e) => {
            error!(
                "Failed to connect to {} (context '{}'): {}",
                ctx.endpoint, ctx.name, e
            );
            None
        }
    }
}
