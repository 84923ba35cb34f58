//! Tally Core Library
//!
//! Shared functionality for the Tally personal finance tracker:
//! - Database access and migrations
//! - Dashboard aggregation and chart bucketing
//! - Month-over-month spending insights
//! - Password hashing and reset tokens
//! - Monthly PDF report rendering and SMTP delivery

pub mod analytics;
pub mod db;
pub mod error;
pub mod mailer;
pub mod models;
pub mod password;
pub mod report;

pub use analytics::InsightConfig;
pub use db::Database;
pub use error::{Error, Result};
pub use mailer::Mailer;
pub use report::{render_monthly_report, MonthlyReport};
