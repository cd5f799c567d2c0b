//! scanward CLI library: argument types, daemon client and command handlers.

pub mod cli;
pub mod client;
pub mod commands;
pub mod error;
pub mod output;

use cli::{Cli, Commands};
use error::CliError;
use output::OutputWriter;

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);
    let config_path = cli.config;

    match cli.command {
        Commands::Scan(args) => commands::scan::execute(args, &config_path, &writer).await,
        Commands::Status(args) => commands::status::execute(args, &config_path, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &config_path, &writer).await,
    }
}
