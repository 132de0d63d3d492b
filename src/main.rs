//! testrig - declarative test automation for local and remote targets

use std::path::PathBuf;

use clap::Parser;
use testrig::commands::Commands;
use testrig::common::{config::Config, logging};
use testrig::{cli, Error};

#[derive(Parser)]
#[command(name = "testrig", about = "Declarative test automation for embedded targets")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Additional directory to search for spec files; may be repeated
    #[arg(long = "tests-path", global = true)]
    tests_paths: Vec<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init(cli.debug);

    let result = run(cli).await;
    if let Err(e) = result {
        // Individual test failures were already reported by the sink
        if !matches!(e, Error::RunFailed) {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> testrig::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    cli::dispatch(cli.command, &config, &cli.tests_paths).await
}
