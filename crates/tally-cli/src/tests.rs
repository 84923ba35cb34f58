//! CLI command tests

use chrono::{Duration, Utc};
use tempfile::TempDir;

use tally_core::analytics::period::{previous_month_window, server_zone};
use tally_core::models::{Category, NewTransaction, TransactionType};

use crate::commands;

#[test]
fn test_init_creates_database_file() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("tally.db");

    commands::cmd_init(&db_path).unwrap();
    assert!(db_path.exists());
}

#[test]
fn test_user_add_and_duplicate() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("tally.db");

    commands::cmd_user_add(&db_path, "Ada", "ada@example.com", "secret123").unwrap();

    // Same email again fails
    let err = commands::cmd_user_add(&db_path, "Ada Again", "ada@example.com", "secret123");
    assert!(err.is_err());

    // Weak password fails before touching the database
    let err = commands::cmd_user_add(&db_path, "Bob", "bob@example.com", "abc");
    assert!(err.is_err());
}

#[test]
fn test_report_writes_pdf_for_active_user() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("tally.db");

    commands::cmd_user_add(&db_path, "Ada", "ada@example.com", "secret123").unwrap();

    // Seed one transaction inside last month's window
    let db = commands::open_db(&db_path).unwrap();
    let user = db.get_user_by_email("ada@example.com").unwrap().unwrap();
    let (start, _) = previous_month_window(Utc::now(), server_zone());
    db.insert_transaction(
        user.id,
        &NewTransaction {
            description: "Groceries".to_string(),
            amount: 80.0,
            category: Category::Food,
            tx_type: TransactionType::Expense,
        },
        start + Duration::days(1),
    )
    .unwrap();
    drop(db);

    let out = dir.path().join("report.pdf");
    commands::cmd_report(&db_path, Some("ada@example.com"), Some(out.as_path()), false).unwrap();

    let bytes = std::fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn test_report_no_activity() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("tally.db");

    commands::cmd_user_add(&db_path, "Ada", "ada@example.com", "secret123").unwrap();

    let out = dir.path().join("report.pdf");
    commands::cmd_report(&db_path, Some("ada@example.com"), Some(out.as_path()), false).unwrap();
    assert!(!out.exists());
}
