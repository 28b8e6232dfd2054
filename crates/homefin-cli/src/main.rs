//! # homefin — invoice tools CLI
//!
//! Generates invoice PDFs from the command line without running the server.

mod commands;

use clap::Parser;

use crate::commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    commands::execute(cli).await
}
