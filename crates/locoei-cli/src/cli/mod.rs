mod commands;
mod dispatch;

use clap::Parser;
use dispatch::stage_command_spec;
use locoei_core::domain::LocoError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let loco_error = error.as_loco_error();
            eprintln!("{}", loco_error.diagnostic_line());
            eprintln!("{}", loco_error.fatal_exit_line());
            loco_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("locoei".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => dispatch_parsed(cli.command),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "locoei",
    version,
    about = "Texas locomotive emissions inventory pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Classify rail links and explode them by carrier
    Network(commands::ConfigArgs),
    /// Allocate statewide fuel to links and project it over the analysis years
    Fuel(commands::ConfigArgs),
    /// Build emission factors by source category, pollutant and year
    Rates(commands::ConfigArgs),
    /// Compute county and yard emission quantities
    Quantity(commands::ConfigArgs),
    /// Apply TxLED and DERI adjustments
    Control(commands::ConfigArgs),
    /// Write statewide fuel and county summary tables
    Summary(commands::ConfigArgs),
    /// Run every stage in order under one date stamp
    Run(commands::ConfigArgs),
    /// Write a run configuration with the inventory defaults
    InitConfig(commands::InitConfigArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Network(args) => dispatch_stage("network", args),
        CliCommand::Fuel(args) => dispatch_stage("fuel", args),
        CliCommand::Rates(args) => dispatch_stage("rates", args),
        CliCommand::Quantity(args) => dispatch_stage("quantity", args),
        CliCommand::Control(args) => dispatch_stage("control", args),
        CliCommand::Summary(args) => dispatch_stage("summary", args),
        CliCommand::Run(args) => commands::run_pipeline_command(args),
        CliCommand::InitConfig(args) => commands::run_init_config_command(args),
    }
}

fn dispatch_stage(command_name: &str, args: commands::ConfigArgs) -> Result<i32, CliError> {
    let spec = stage_command_spec(command_name).ok_or_else(|| {
        CliError::Compute(LocoError::internal(
            "SYS.CLI_COMMAND",
            format!("stage command '{command_name}' is not registered"),
        ))
    })?;
    commands::run_stage_command(spec, args)
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(LocoError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    fn as_loco_error(&self) -> LocoError {
        match self {
            Self::Usage(message) => LocoError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => LocoError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}
