//! CLI command definitions and dispatch.

pub mod parse;
pub mod scenarios;
pub mod verify;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use crival_common::config::ValidateConfig;

/// crival — container log decoder and conformance checks for CRI runtimes.
#[derive(Parser, Debug)]
#[command(name = "crival", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// JSON configuration file overriding the default timeouts.
    #[arg(long, global = true, env = "CRIVAL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit diagnostics as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a container log file and print its records.
    Parse(parse::ParseArgs),
    /// Check that a container log file holds a message.
    Verify(verify::VerifyArgs),
    /// List the container conformance scenarios.
    Scenarios,
}

/// Loads the configuration named on the command line, or the defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is invalid.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ValidateConfig> {
    let config = match path {
        Some(p) => ValidateConfig::from_file(p)?,
        None => ValidateConfig::default(),
    };
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Parse(args) => parse::execute(&args),
        Command::Verify(args) => verify::execute(&args, &config),
        Command::Scenarios => {
            scenarios::execute();
            Ok(())
        }
    }
}
