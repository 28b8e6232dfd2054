//! Invoice web service binary.

use std::path::PathBuf;

use clap::Parser;
use homefin_common::constants::{DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH};
use tracing_subscriber::EnvFilter;

/// Invoice web service.
#[derive(Debug, Parser)]
#[command(name = "homefin-server", version, about)]
struct Args {
    /// Path to the configuration file.
    #[arg(short = 'c', long, env = ENV_CONFIG_PATH, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Host to bind, overriding the config file.
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to bind, overriding the config file.
    #[arg(short = 'p', long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    homefin_server::run(&args.config, args.host, args.port).await
}
