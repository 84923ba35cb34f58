//! Time-bucketed chart data
//!
//! Weekly charts cover the seven days ending at `now` (wall clock, not the
//! reporting timezone); monthly charts cover one bucket per calendar day
//! of the current month as evaluated in the reporting timezone. Bucket
//! indices that land outside the chart are dropped, not errored.

use chrono::{DateTime, Datelike, Duration, Utc};

use crate::models::{Period, TimeSeries, TimeSeriesSummary, Transaction, TransactionType};

use super::period::{days_in_month, month_window, reporting_zone};

/// Store query window for a chart period, as UTC instants `[start, end)`
pub fn query_window(period: Period, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    match period {
        Period::Weekly => (now - Duration::days(6), now),
        Period::Monthly => month_window(now, reporting_zone()),
    }
}

/// Bucket a transaction set for charting
pub fn bucket(period: Period, now: DateTime<Utc>, transactions: &[Transaction]) -> TimeSeries {
    match period {
        Period::Weekly => bucket_weekly(now, transactions),
        Period::Monthly => bucket_monthly(now, transactions),
    }
}

fn empty_series(period: Period, labels: Vec<String>) -> TimeSeries {
    let slots = labels.len();
    TimeSeries {
        labels,
        income: vec![0.0; slots],
        expenses: vec![0.0; slots],
        summary: TimeSeriesSummary {
            total_income: 0.0,
            total_expense: 0.0,
            period: period.display_name().to_string(),
        },
    }
}

/// Add a transaction into bucket `idx`. Totals only count transactions
/// that actually landed in a bucket.
fn accumulate(series: &mut TimeSeries, idx: usize, tx: &Transaction) {
    match tx.tx_type {
        TransactionType::Income => {
            series.income[idx] += tx.amount;
            series.summary.total_income += tx.amount;
        }
        TransactionType::Expense => {
            series.expenses[idx] += tx.amount;
            series.summary.total_expense += tx.amount;
        }
    }
}

fn bucket_weekly(now: DateTime<Utc>, transactions: &[Transaction]) -> TimeSeries {
    // Labels run "6 days ago" .. "today"
    let labels = (0..7)
        .map(|i| (now - Duration::days(6 - i)).format("%a").to_string())
        .collect();
    let mut series = empty_series(Period::Weekly, labels);

    for tx in transactions {
        // Whole days elapsed truncate toward zero, so a timestamp a moment
        // ahead of `now` still counts as zero days elapsed.
        let days_ago = (now - tx.date).num_days();
        let idx = 6 - days_ago;
        if (0..7).contains(&idx) {
            accumulate(&mut series, idx as usize, tx);
        }
    }

    series
}

fn bucket_monthly(now: DateTime<Utc>, transactions: &[Transaction]) -> TimeSeries {
    let zone = reporting_zone();
    let local_now = now.with_timezone(&zone);
    let days = days_in_month(local_now.year(), local_now.month());

    let labels = (1..=days).map(|d| d.to_string()).collect();
    let mut series = empty_series(Period::Monthly, labels);

    for tx in transactions {
        let day_of_month = tx.date.with_timezone(&zone).day();
        let idx = (day_of_month - 1) as usize;
        if idx < series.labels.len() {
            accumulate(&mut series, idx, tx);
        }
    }

    series
}
