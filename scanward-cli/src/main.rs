//! scanward command-line entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use scanward_cli::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Diagnostics go to stderr so JSON output on stdout stays parseable.
    let filter = match &cli.log_level {
        Some(level) => Some(EnvFilter::new(level)),
        None => EnvFilter::try_from_default_env().ok(),
    };
    if let Some(filter) = filter {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    if let Err(err) = scanward_cli::run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}
