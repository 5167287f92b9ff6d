//! Deploy command handler
//!
//! Deploys a compiled pipeline package as a new version and, unless
//! `--deploy-only` is given, starts a run of that version.

use anyhow::{Context, Result, anyhow};
use clap::Args;
use colored::*;
use kfdeploy_client::PipelineApi;
use kfdeploy_core::params::{ParamValue, Parameters};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

use super::ConnectionArgs;
use crate::config::{Config, ResolvedContext};
use crate::service::{deployer, runner};

/// Parameters file read when `--params-file` is not given
pub const DEFAULT_PARAMS_FILE: &str = "pipeline_params.yaml";

#[derive(Args, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Experiment to start the run in
    #[arg(short = 'e', long)]
    pub experiment: Option<String>,

    /// Compiled pipeline package
    #[arg(short = 'f', long)]
    pub pipeline_package_path: PathBuf,

    /// Name of the version to upload
    #[arg(short = 'v', long)]
    pub pipeline_version: String,

    /// Upload the pipeline without starting a run
    #[arg(short = 'd', long)]
    pub deploy_only: bool,

    /// Write the started run's id to this file
    #[arg(short = 'o', long)]
    pub output_file: Option<PathBuf>,

    /// YAML mapping of run parameters
    #[arg(long, default_value = DEFAULT_PARAMS_FILE)]
    pub params_file: PathBuf,

    /// Run parameter as key=value, overriding the parameters file
    #[arg(short = 'p', long, value_parser = parse_key_val)]
    pub param: Vec<(String, String)>,
}

/// Parse a single key=value pair
fn parse_key_val(s: &str) -> Result<(String, String)> {
    let pos = s
        .find('=')
        .ok_or_else(|| anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Handle the deploy command
pub async fn handle_deploy_command(args: DeployArgs, config: &Config) -> Result<ExitCode> {
    let ctx = config
        .resolve(
            &args.connection.context,
            &args.connection.overrides(args.experiment.clone()),
        )
        .context("Invalid connection settings")?;

    // Check run inputs before touching the service so a bad invocation changes nothing
    let experiment = run_experiment(&args, &ctx)?;
    let parameters = match experiment {
        Some(_) => load_parameters(&args.params_file, &args.param)?,
        None => Parameters::default(),
    };

    let Some(session) = super::connect(&ctx).await else {
        return Ok(ExitCode::FAILURE);
    };

    execute(&session, &args, experiment, &ctx, &parameters).await
}

/// Experiment the run will be started in; `None` when deploy-only
fn run_experiment<'a>(args: &DeployArgs, ctx: &'a ResolvedContext) -> Result<Option<&'a str>> {
    if args.deploy_only {
        return Ok(None);
    }

    ctx.experiment.as_deref().map(Some).ok_or_else(|| {
        anyhow!(
            "No experiment for context '{}': pass --experiment or set it in the config file",
            ctx.name
        )
    })
}

/// Deploy, then start a run in `experiment` if there is one
async fn execute<S: PipelineApi + ?Sized>(
    session: &S,
    args: &DeployArgs,
    experiment: Option<&str>,
    ctx: &ResolvedContext,
    parameters: &Parameters,
) -> Result<ExitCode> {
    let deployment =
        match deployer::deploy(session, &args.pipeline_package_path, &args.pipeline_version).await
        {
            Ok(deployment) => deployment,
            Err(_) => return Ok(ExitCode::FAILURE),
        };

    if deployment.pipeline_created {
        println!("{}", "✓ Pipeline created successfully!".green().bold());
    }
    println!("{}", "✓ Version uploaded successfully!".green().bold());
    println!("  Pipeline: {} ({})", deployment.pipeline_name.bold(), deployment.pipeline_id.cyan());
    println!("  Version:  {} ({})", deployment.version.name.bold(), deployment.version.id.cyan());

    let Some(experiment) = experiment else {
        info!("Deploy only, not starting a run");
        return Ok(ExitCode::SUCCESS);
    };

    let run = match runner::run(
        session,
        experiment,
        &deployment.version.id,
        parameters,
        ctx.label_offset,
    )
    .await
    {
        Ok(run) => run,
        Err(_) => return Ok(ExitCode::FAILURE),
    };

    println!("{}", "✓ Run started successfully!".green().bold());
    println!("  ID:   {}", run.id.cyan());
    println!("  Name: {}", run.name.bold());

    if let Some(path) = &args.output_file {
        std::fs::write(path, &run.id)
            .with_context(|| format!("Failed to write run id to {}", path.display()))?;
        info!("Wrote run id to {}", path.display());
    }

    Ok(ExitCode::SUCCESS)
}

/// Read the parameters file and apply `key=value` overrides
///
/// A missing default parameters file means no parameters; a missing file
/// named explicitly is an error.
fn load_parameters(path: &Path, overrides: &[(String, String)]) -> Result<Parameters> {
    let mut parameters = if path.exists() || path != Path::new(DEFAULT_PARAMS_FILE) {
        Parameters::from_path(path)
            .with_context(|| format!("Invalid parameters file {}", path.display()))?
    } else {
        info!("No {} found, running without a parameters file", DEFAULT_PARAMS_FILE);
        Parameters::default()
    };

    for (key, value) in overrides {
        parameters.set(key.clone(), ParamValue::String(value.clone()));
    }

    Ok(parameters)
}
