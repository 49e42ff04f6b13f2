//! pagewarden CLI entry point.
//!
//! Dispatches subcommands and maps [`CliError`] values to process exit
//! codes. Logs go to stderr so stdout stays clean for command output.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pagewarden_cli::cli::{Cli, Commands};
use pagewarden_cli::error::CliError;
use pagewarden_cli::output::OutputWriter;
use pagewarden_cli::commands;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    let log_level = args.log_level.as_deref().unwrap_or("warn");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let writer = OutputWriter::new(args.output);

    let result = run(args, &writer).await;

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(args: Cli, writer: &OutputWriter) -> Result<(), CliError> {
    match args.command {
        Commands::Start(start_args) => commands::start::execute(start_args, &args.config).await,
        Commands::Status(status_args) => {
            commands::status::execute(status_args, &args.config, writer).await
        }
        Commands::Check(check_args) => {
            commands::check::execute(check_args, &args.config, writer).await
        }
        Commands::Config(config_args) => {
            commands::config::execute(config_args, &args.config, writer).await
        }
    }
}
