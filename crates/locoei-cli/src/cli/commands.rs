use super::CliError;
use super::dispatch::{StageCommandSpec, stage_command_for_stage};
use anyhow::Context;
use locoei_core::common::config::{
    ConfigError, DEFAULT_CONFIG_FILE, RunConfig, load_run_config,
};
use locoei_core::domain::{LocoError, StageOutput};
use locoei_core::modules::{run_pipeline, run_stage};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(clap::Args)]
pub(super) struct ConfigArgs {
    /// Run configuration (JSON)
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[derive(clap::Args)]
pub(super) struct InitConfigArgs {
    /// Where to write the default configuration
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

fn config_error(error: ConfigError) -> LocoError {
    match error {
        ConfigError::Read { .. } => LocoError::io_system("IO.CONFIG_READ", error.to_string()),
        ConfigError::Parse { .. } => {
            LocoError::input_validation("INPUT.CONFIG_PARSE", error.to_string())
        }
        ConfigError::Invalid(_) => {
            LocoError::input_validation("INPUT.CONFIG_INVALID", error.to_string())
        }
    }
}

fn load_config(args: &ConfigArgs) -> Result<RunConfig, CliError> {
    let config = load_run_config(&args.config)
        .map_err(|error| CliError::Compute(config_error(error)))?;
    debug!(
        config = %args.config.display(),
        raw = %config.raw_dir.display(),
        interim = %config.interim_dir.display(),
        processed = %config.processed_dir.display(),
        "loaded run configuration"
    );
    Ok(config)
}

fn print_stage_output(spec: StageCommandSpec, output: &StageOutput) {
    println!(
        "{} completed: {} ({} artifacts).",
        spec.stage,
        spec.summary,
        output.artifacts.len()
    );
    for artifact in &output.artifacts {
        println!("  {} ({} rows)", artifact.path.display(), artifact.rows);
    }
    if !output.report.is_clean() {
        println!(
            "  {} data-quality violation(s) logged as warnings",
            output.report.violations().len()
        );
    }
}

pub(super) fn run_stage_command(spec: StageCommandSpec, args: ConfigArgs) -> Result<i32, CliError> {
    let config = load_config(&args)?;
    println!("Running {}...", spec.stage);
    let output = run_stage(spec.stage, &config).map_err(CliError::Compute)?;
    print_stage_output(spec, &output);
    Ok(0)
}

pub(super) fn run_pipeline_command(args: ConfigArgs) -> Result<i32, CliError> {
    let config = load_config(&args)?;
    let run = run_pipeline(&config).map_err(CliError::Compute)?;
    for (stage, output) in &run.stages {
        if let Some(spec) = stage_command_for_stage(*stage) {
            print_stage_output(spec, output);
        }
    }
    println!(
        "Completed {} stages for run {}.",
        run.stages.len(),
        run.run_stamp
    );
    Ok(0)
}

pub(super) fn run_init_config_command(args: InitConfigArgs) -> Result<i32, CliError> {
    if args.output.exists() && !args.force {
        return Err(CliError::Usage(format!(
            "'{}' already exists; pass --force to overwrite it.",
            args.output.display()
        )));
    }
    write_default_config(&args.output)?;
    println!("Wrote default configuration to {}.", args.output.display());
    Ok(0)
}

fn write_default_config(path: &Path) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(&RunConfig::default())
        .context("failed to render default configuration")?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create '{}'", parent.display()))?;
    }
    fs::write(path, format!("{rendered}\n"))
        .with_context(|| format!("failed to write '{}'", path.display()))
}
