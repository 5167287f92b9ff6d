//! Wait command handler

use anyhow::{Context, Result};
use clap::Args;
use kfdeploy_client::PipelineApi;
use std::process::ExitCode;
use std::time::Duration;
use tracing::error;

use super::ConnectionArgs;
use crate::config::Config;
use crate::service::WaitSettings;
use crate::service::waiter;

#[derive(Args, Debug)]
pub struct WaitArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Run to wait for
    #[arg(short = 'r', long)]
    pub run_id: String,

    /// Give up after this many seconds and report TimeoutError
    #[arg(short = 't', long, default_value_t = 18_000)]
    pub timeout_seconds: u64,

    /// Seconds between status checks, overriding the context's setting
    #[arg(long)]
    pub poll_interval_seconds: Option<u64>,
}

/// Handle the wait command
///
/// Every observed outcome, including a timeout, exits 0.
pub async fn handle_wait_command(args: WaitArgs, config: &Config) -> Result<ExitCode> {
    let ctx = config
        .resolve(&args.connection.context, &args.connection.overrides(None))
        .context("Invalid connection settings")?;

    let settings = WaitSettings {
        timeout: Duration::from_secs(args.timeout_seconds),
        poll_interval: args
            .poll_interval_seconds
            .filter(|&s| s > 0)
            .map(Duration::from_secs)
            .unwrap_or(ctx.poll_interval),
        ..Default::default()
    };

    let Some(session) = super::connect(&ctx).await else {
        return Ok(ExitCode::FAILURE);
    };

    Ok(execute(&session, &args.run_id, &settings).await)
}

async fn execute<S: PipelineApi + ?Sized>(
    session: &S,
    run_id: &str,
    settings: &WaitSettings,
) -> ExitCode {
    match waiter::wait(session, run_id, settings).await {
        Ok(outcome) => {
            println!("Status: {}", outcome);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to get status of run {}: {}", run_id, e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fake::{FakeService, Poll};

    fn settings(timeout_secs: u64) -> WaitSettings {
        WaitSettings {
            timeout: Duration::from_secs(timeout_secs),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_run_still_exits_zero() {
        let service = FakeService::new().with_polls("run-1", vec![Poll::Status("Failed")]);
        assert_eq!(execute(&service, "run-1", &settings(60)).await, ExitCode::SUCCESS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_exits_zero() {
        let service = FakeService::new().with_polls("run-1", vec![Poll::Status("Running")]);
        assert_eq!(execute(&service, "run-1", &settings(1)).await, ExitCode::SUCCESS);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_run_exits_failure() {
        let service = FakeService::new();
        assert_eq!(execute(&service, "missing", &settings(60)).await, ExitCode::FAILURE);
    }
}
