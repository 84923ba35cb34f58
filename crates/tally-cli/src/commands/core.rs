//! Core command implementations and shared utilities

use std::path::Path;

use anyhow::{Context, Result};
use tally_core::db::Database;

/// Open the database, creating it (and its schema) on first use
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("Initializing database at {}...", db_path.display());

    open_db(db_path)?;

    println!("Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Create an account: tally user add --name You --email you@example.com --password ...");
    println!("  2. Start the API server: tally serve");

    Ok(())
}
