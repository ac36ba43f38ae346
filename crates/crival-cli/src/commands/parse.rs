//! `crival parse` — Decode a container log file.

use std::path::PathBuf;

use clap::Args;

use crate::output;

/// Arguments for the `parse` command.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Log file to decode.
    pub file: PathBuf,

    /// Print one JSON object per record instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `parse` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or a line does not decode.
pub fn execute(args: &ParseArgs) -> anyhow::Result<()> {
    let sequence = crival_log::read_all(&args.file)?;
    tracing::info!(file = %args.file.display(), records = sequence.len(), "decoded log file");

    if args.json {
        for record in &sequence {
            println!("{}", serde_json::to_string(record)?);
        }
        return Ok(());
    }

    if sequence.is_empty() {
        println!("No records in {}", args.file.display());
        return Ok(());
    }
    println!("{:<32} {:<8} PAYLOAD", "TIMESTAMP", "STREAM");
    for record in &sequence {
        println!("{}", output::format_record(record));
    }
    Ok(())
}
