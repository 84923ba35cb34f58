//! Time-windowed aggregation and insight derivation
//!
//! This module is organized by concern:
//! - `period` - calendar window policies (the two timezone conventions)
//! - `summary` - dashboard totals and category breakdown
//! - `timeseries` - weekly/monthly chart bucketing
//! - `insights` - month-over-month spending observations
//!
//! Storage and query boundaries are UTC; each submodule documents which
//! calendar convention it applies on top of that.

use chrono::{DateTime, Utc};

use crate::db::Database;
use crate::error::Result;
use crate::models::{Insight, Period, Summary, TimeSeries};

pub mod insights;
pub mod period;
pub mod summary;
pub mod timeseries;

pub use insights::InsightConfig;

/// Dashboard summary over a user's full history
pub fn dashboard_summary(db: &Database, user_id: i64) -> Result<Summary> {
    let transactions = db.find_transactions(user_id, None, None)?;
    Ok(summary::summarize(&transactions))
}

/// Chart data for the requested period as of `now`
pub fn time_series(
    db: &Database,
    user_id: i64,
    period: Period,
    now: DateTime<Utc>,
) -> Result<TimeSeries> {
    let window = timeseries::query_window(period, now);
    let transactions = db.find_transactions(user_id, Some(window), None)?;
    Ok(timeseries::bucket(period, now, &transactions))
}

/// Spending insights for a user as of `now`
pub fn user_insights(
    db: &Database,
    user_id: i64,
    now: DateTime<Utc>,
    config: &InsightConfig,
) -> Result<Vec<Insight>> {
    insights::generate(db, user_id, now, config)
}
