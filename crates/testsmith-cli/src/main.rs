//! testsmith CLI entry point.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use testsmith_cli::cli::Cli;
use testsmith_cli::commands;

fn main() {
    // Local secrets first, then the user-wide file; existing vars win.
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_path(testsmith_core::config::env_file());
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));

    fmt().with_env_filter(filter).with_target(false).init();

    if let Err(e) = commands::execute(cli.command, cli.config.as_deref()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
