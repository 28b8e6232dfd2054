//! CLI command definitions and dispatch.

pub mod invoice;

use clap::{Parser, Subcommand};
use homefin_common::constants::APP_NAME;

/// homefin, a set of home financial tools.
#[derive(Parser, Debug)]
#[command(name = APP_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an invoice PDF from consecutive billing segments.
    Invoice(invoice::InvoiceArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Invoice(args) => invoice::execute(args).await,
    }
}
