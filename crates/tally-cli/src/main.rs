//! Tally CLI - Personal finance tracker
//!
//! Usage:
//!   tally init                        Initialize database
//!   tally user add --name N --email E --password P
//!   tally serve --port 3000           Start web server
//!   tally report --email E --out F    Generate last month's PDF report

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db),
        Commands::User { command } => match command {
            UserCommands::Add {
                name,
                email,
                password,
            } => commands::cmd_user_add(&cli.db, &name, &email, &password),
        },
        Commands::Serve { host, port } => commands::cmd_serve(&cli.db, &host, port).await,
        Commands::Report { email, out, send } => {
            commands::cmd_report(&cli.db, email.as_deref(), out.as_deref(), send)
        }
    }
}
