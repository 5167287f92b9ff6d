//! Inspect command handler
//!
//! Parses a pipeline package offline and shows what a deploy would register.

use anyhow::Result;
use clap::Args;
use colored::*;
use kfdeploy_core::definition::PipelineDefinition;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Compiled pipeline package
    #[arg(short = 'f', long)]
    pub pipeline_package_path: PathBuf,
}

/// Handle the inspect command
pub fn handle_inspect_command(args: InspectArgs) -> Result<ExitCode> {
    let definition = match PipelineDefinition::from_path(&args.pipeline_package_path) {
        Ok(definition) => definition,
        Err(e) => {
            error!("{}: {}", args.pipeline_package_path.display(), e);
            return Ok(ExitCode::FAILURE);
        }
    };

    print_definition(&definition);
    Ok(ExitCode::SUCCESS)
}

fn print_definition(definition: &PipelineDefinition) {
    println!("{}", definition.name().bold());
    println!(
        "  Description: {}",
        definition.description().unwrap_or("-").dimmed()
    );

    match definition.steps() {
        Ok(steps) if steps.is_empty() => println!("  Steps:       {}", "none".dimmed()),
        Ok(steps) => {
            println!("  Steps:");
            for (i, step) in steps.iter().enumerate() {
                let after = if step.dependencies.is_empty() {
                    String::new()
                } else {
                    format!("(after {})", step.dependencies.join(", "))
                };
                println!("    {}. {} {}", i + 1, step.name.cyan(), after.dimmed());
            }
        }
        Err(e) => println!("  Steps:       {}", e.to_string().red()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_inspect_valid_package() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "metadata:\n  annotations: demo\nspec:\n  entrypoint: flower-pipeline\n").unwrap();

        let code = handle_inspect_command(InspectArgs {
            pipeline_package_path: file.path().to_path_buf(),
        })
        .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[test]
    fn test_inspect_missing_entrypoint() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "metadata:\n  annotations: demo\n").unwrap();

        let code = handle_inspect_command(InspectArgs {
            pipeline_package_path: file.path().to_path_buf(),
        })
        .unwrap();
        assert_eq!(code, ExitCode::FAILURE);
    }
}
