//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Track income, expenses, and spending insights
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Self-hosted personal finance tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "tally.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Manage user accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate last month's financial report
    Report {
        /// Email of the user to report on (omit to process every user)
        #[arg(long)]
        email: Option<String>,

        /// Write the PDF to this file instead of emailing it
        /// (requires --email)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Email the report via the configured SMTP relay
        #[arg(long)]
        send: bool,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user account
    Add {
        /// Display name
        #[arg(long)]
        name: String,

        /// Email address (also the login)
        #[arg(long)]
        email: String,

        /// Initial password
        #[arg(long)]
        password: String,
    },
}
