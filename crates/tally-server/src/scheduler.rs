//! Background scheduler for monthly report emails
//!
//! Optional; enabled via environment variables:
//!
//! - `TALLY_REPORT_SCHEDULE`: check interval in hours (e.g., "24" for a
//!   daily check; unset or "0" disables the scheduler)
//!
//! Each tick is a no-op unless the current UTC day is the last day of the
//! month. On the last day, every user with activity in the previous
//! calendar month gets a PDF report emailed to them.

use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use tokio::time::interval;
use tracing::{error, info, warn};

use tally_core::db::Database;
use tally_core::mailer::Mailer;
use tally_core::report::previous_month_report;

/// Configuration for scheduled monthly reports
#[derive(Debug, Clone)]
pub struct ReportScheduleConfig {
    /// Interval between checks in hours
    pub interval_hours: u64,
}

impl ReportScheduleConfig {
    /// Parse configuration from environment variables
    ///
    /// Returns None if scheduling is not configured (TALLY_REPORT_SCHEDULE
    /// not set)
    pub fn from_env() -> Option<Self> {
        let interval_hours: u64 = std::env::var("TALLY_REPORT_SCHEDULE")
            .ok()
            .and_then(|s| s.parse().ok())?;

        if interval_hours == 0 {
            warn!("TALLY_REPORT_SCHEDULE is 0, monthly reports disabled");
            return None;
        }

        Some(Self { interval_hours })
    }
}

/// True when tomorrow belongs to a different month
fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.succ_opt()
        .map(|tomorrow| tomorrow.month() != date.month())
        .unwrap_or(false)
}

/// Start the report scheduler as a background task
///
/// This function spawns a tokio task that runs indefinitely, checking at
/// the configured interval whether the month is ending.
pub fn start_report_scheduler(db: Database, config: ReportScheduleConfig) {
    info!(
        "Starting monthly report scheduler: checking every {} hours",
        config.interval_hours
    );

    tokio::spawn(async move {
        let mailer = Mailer::from_env();
        if mailer.is_none() {
            warn!("SMTP not configured; reports will be generated but not emailed");
        }

        let mut ticker = interval(Duration::from_secs(config.interval_hours * 3600));

        // Skip the first immediate tick - we don't want to run on startup
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let now = Utc::now();
            if !is_last_day_of_month(now.date_naive()) {
                continue;
            }

            info!("Month is ending; generating monthly reports...");
            match run_monthly_reports(&db, mailer.as_ref(), now) {
                Ok(count) => info!("Monthly report run complete: {} report(s)", count),
                Err(e) => error!("Monthly report run failed: {}", e),
            }
        }
    });
}

/// Generate and deliver the previous-month report for every user with
/// activity. Per-user failures are logged and skipped so one bad account
/// cannot starve the rest.
pub fn run_monthly_reports(
    db: &Database,
    mailer: Option<&Mailer>,
    now: DateTime<Utc>,
) -> tally_core::Result<usize> {
    let mut generated = 0;

    for user in db.list_users()? {
        let report = match previous_month_report(db, &user, now) {
            Ok(Some(report)) => report,
            Ok(None) => {
                info!(user = %user.email, "No activity last month; skipping report");
                continue;
            }
            Err(e) => {
                error!(user = %user.email, error = %e, "Failed to build report");
                continue;
            }
        };

        let (month, year, pdf) = report;
        generated += 1;

        match mailer {
            Some(m) => {
                if let Err(e) = m.send_monthly_report(&user.email, &month, year, pdf) {
                    error!(user = %user.email, error = %e, "Failed to email report");
                }
            }
            None => {
                info!(user = %user.email, "SMTP not configured; skipping email delivery");
            }
        }
    }

    Ok(generated)
}
