//! User account management commands

use std::path::Path;

use anyhow::{bail, Context, Result};
use tally_core::password::hash_password;

use super::core::open_db;

pub fn cmd_user_add(db_path: &Path, name: &str, email: &str, password: &str) -> Result<()> {
    let name = name.trim();
    if name.len() < 2 || name.len() > 50 {
        bail!("Name must be between 2 and 50 characters");
    }
    if password.len() < 6 {
        bail!("Password must be at least 6 characters long");
    }

    let db = open_db(db_path)?;
    let email = email.trim().to_lowercase();

    if db.get_user_by_email(&email)?.is_some() {
        bail!("User already exists with email {}", email);
    }

    let password_hash = hash_password(password).context("Failed to hash password")?;
    let id = db.create_user(name, &email, &password_hash)?;

    println!("Created user #{}: {} <{}>", id, name, email);
    Ok(())
}
