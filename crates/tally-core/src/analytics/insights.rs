//! Month-over-month spending insights
//!
//! Compares the current calendar month against the previous one (server
//! calendar convention, see `period`) and emits natural-language
//! observations. Message wording is selected from ordered rule tables so
//! every phrasing band lives in one place.

use chrono::{DateTime, Datelike, Utc};

use crate::db::Database;
use crate::error::Result;
use crate::models::{Category, Insight, InsightKind, Transaction, TransactionType};

use super::period::{month_name, month_window, previous_month, previous_month_window, server_zone};

/// Thresholds (absolute percentage change) above which insights fire
#[derive(Debug, Clone)]
pub struct InsightConfig {
    /// Minimum |change| for a per-category insight
    pub category_change_pct: f64,
    /// Minimum |change| for the overall trend insight
    pub overall_trend_pct: f64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            category_change_pct: 20.0,
            overall_trend_pct: 10.0,
        }
    }
}

/// Generate insights for a user as of `now`.
///
/// Issues three independent store fetches (all-time, current month,
/// previous month); correctness does not depend on their order. Store
/// failures propagate whole, never as partial results.
pub fn generate(
    db: &Database,
    user_id: i64,
    now: DateTime<Utc>,
    config: &InsightConfig,
) -> Result<Vec<Insight>> {
    let zone = server_zone();
    let current_window = month_window(now, zone);
    let previous_window = previous_month_window(now, zone);

    let all_time = db.find_transactions(user_id, None, None)?;
    let current = db.find_transactions(user_id, Some(current_window), None)?;
    let previous = db.find_transactions(user_id, Some(previous_window), None)?;

    Ok(derive(&current, &previous, all_time.len(), now, config))
}

/// Pure derivation over already-fetched month snapshots
pub fn derive(
    current: &[Transaction],
    previous: &[Transaction],
    all_time_count: usize,
    now: DateTime<Utc>,
    config: &InsightConfig,
) -> Vec<Insight> {
    let local = now.with_timezone(&server_zone());
    let current_month = month_name(local.month());
    let (_, prev_month_num) = previous_month(local.year(), local.month());
    let prev_month = month_name(prev_month_num);

    if current.is_empty() {
        let insight = if all_time_count > 0 {
            Insight {
                kind: InsightKind::Info,
                message: format!(
                    "No transactions found for the current month ({} {}).",
                    current_month,
                    local.year()
                ),
                details: format!(
                    "You have {} total transactions, but none in {} {}. Add some transactions to see insights.",
                    all_time_count,
                    current_month,
                    local.year()
                ),
                category: None,
                percentage_change: None,
            }
        } else {
            Insight {
                kind: InsightKind::Info,
                message: "No transactions found in your account.".to_string(),
                details: "Add some transactions to start seeing spending insights.".to_string(),
                category: None,
                percentage_change: None,
            }
        };
        return vec![insight];
    }

    let current_spending = expense_totals(current);
    let previous_spending = expense_totals(previous);

    let mut insights = Vec::new();

    // Categories present only in the previous month are never visited
    for &(category, current_amount) in &current_spending {
        let previous_amount = previous_spending
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, a)| *a)
            .unwrap_or(0.0);
        let pct = percentage_change(current_amount, previous_amount);

        if pct.abs() >= config.category_change_pct {
            let ctx = CategoryContext {
                category,
                abs_change: pct.round().abs() as i64,
                current: current_amount,
                previous: previous_amount,
                current_month,
                previous_month: prev_month,
            };
            insights.push(Insight {
                kind: InsightKind::CategoryChange,
                message: select_category_message(pct, &ctx),
                details: format!(
                    "Current: {} | Previous: {}",
                    currency(current_amount),
                    currency(previous_amount)
                ),
                category: Some(category),
                percentage_change: Some(pct.round() as i64),
            });
        }
    }

    let current_total: f64 = current_spending.iter().map(|(_, a)| a).sum();
    let previous_total: f64 = previous_spending.iter().map(|(_, a)| a).sum();
    let total_pct = percentage_change(current_total, previous_total);

    if total_pct.abs() >= config.overall_trend_pct {
        let ctx = OverallContext {
            abs_change: total_pct.round().abs() as i64,
            total: current_total,
            saved: saved_amount(current_total, previous_total, total_pct),
        };
        insights.push(Insight {
            kind: InsightKind::OverallTrend,
            message: select_overall_message(total_pct, &ctx),
            details: format!(
                "Total spending: {} | Previous: {}",
                currency(current_total),
                currency(previous_total)
            ),
            category: None,
            percentage_change: Some(total_pct.round() as i64),
        });
    }

    // A month with activity always yields at least one insight
    if insights.is_empty() {
        insights.push(Insight {
            kind: InsightKind::Info,
            message: format!(
                "Found {} transactions in current month but no significant changes detected.",
                current.len()
            ),
            details: format!(
                "Total current month spending: {}. Try adding more transactions or transactions from previous month for comparison.",
                currency(current_total)
            ),
            category: None,
            percentage_change: None,
        });
    }

    insights
}

/// Per-category expense totals in first-seen order; income is excluded
fn expense_totals(transactions: &[Transaction]) -> Vec<(Category, f64)> {
    let mut totals: Vec<(Category, f64)> = Vec::new();
    for tx in transactions {
        if tx.tx_type != TransactionType::Expense {
            continue;
        }
        match totals.iter_mut().find(|(c, _)| *c == tx.category) {
            Some((_, amount)) => *amount += tx.amount,
            None => totals.push((tx.category, tx.amount)),
        }
    }
    totals
}

/// Percentage change with the zero-previous convention: a category that
/// appears out of nowhere counts as +100%, and no activity on either side
/// is 0%.
fn percentage_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        if current > 0.0 {
            100.0
        } else {
            0.0
        }
    } else {
        (current - previous) / previous * 100.0
    }
}

/// Recover the saved amount from the current total and the percentage.
/// A change of exactly -100% means every expense was eliminated, so the
/// saved amount is the whole previous total rather than a division by zero.
fn saved_amount(current_total: f64, previous_total: f64, pct: f64) -> f64 {
    let divisor = 1.0 + pct / 100.0;
    let recovered_previous = if divisor.abs() < f64::EPSILON {
        previous_total
    } else {
        current_total / divisor
    };
    (current_total - recovered_previous).abs()
}

/// Display form for amounts inside insight text
fn currency(amount: f64) -> String {
    format!("${:.2}", amount)
}

struct CategoryContext<'a> {
    category: Category,
    abs_change: i64,
    current: f64,
    previous: f64,
    current_month: &'a str,
    previous_month: &'a str,
}

struct OverallContext {
    abs_change: i64,
    total: f64,
    saved: f64,
}

type CategoryRule = (fn(f64) -> bool, fn(&CategoryContext) -> String);
type OverallRule = (fn(f64) -> bool, fn(&OverallContext) -> String);

/// Ordered top-to-bottom; the first matching predicate wins.
///
/// The catch-all also receives positive changes that cleared the threshold
/// but missed the bands above it (a +20% change reads as "20% less").
/// Tests pin this phrasing; changing the bands changes user-visible text.
const CATEGORY_RULES: &[CategoryRule] = &[
    (
        |pct| pct > 50.0,
        |ctx| {
            format!(
                "Your {} spending spiked by {}% in {}! You spent {} compared to {} in {}.",
                ctx.category,
                ctx.abs_change,
                ctx.current_month,
                currency(ctx.current),
                currency(ctx.previous),
                ctx.previous_month
            )
        },
    ),
    (
        |pct| pct > 20.0,
        |ctx| {
            format!(
                "You spent {}% more on {} this month compared to last month ({} vs {}).",
                ctx.abs_change,
                ctx.category,
                currency(ctx.current),
                currency(ctx.previous)
            )
        },
    ),
    (
        |pct| pct < -50.0,
        |ctx| {
            format!(
                "Great job! You cut your {} spending by {}% this month, saving {}.",
                ctx.category,
                ctx.abs_change,
                currency(ctx.previous - ctx.current)
            )
        },
    ),
    (
        |_| true,
        |ctx| {
            format!(
                "You spent {}% less on {} this month compared to last month ({} vs {}).",
                ctx.abs_change,
                ctx.category,
                currency(ctx.current),
                currency(ctx.previous)
            )
        },
    ),
];

/// Ordered top-to-bottom; the first matching predicate wins.
const OVERALL_RULES: &[OverallRule] = &[
    (
        |pct| pct > 30.0,
        |ctx| {
            format!(
                "Your overall spending increased significantly by {}% this month. Total spending: {}.",
                ctx.abs_change,
                currency(ctx.total)
            )
        },
    ),
    (
        |pct| pct > 0.0,
        |ctx| {
            format!(
                "Your overall spending is {}% higher this month at {}.",
                ctx.abs_change,
                currency(ctx.total)
            )
        },
    ),
    (
        |pct| pct < -30.0,
        |ctx| {
            format!(
                "Excellent! You reduced your overall spending by {}% this month, saving {}!",
                ctx.abs_change,
                currency(ctx.saved)
            )
        },
    ),
    (
        |_| true,
        |ctx| {
            format!(
                "Your overall spending is {}% lower this month at {}.",
                ctx.abs_change,
                currency(ctx.total)
            )
        },
    ),
];

fn select_category_message(pct: f64, ctx: &CategoryContext) -> String {
    CATEGORY_RULES
        .iter()
        .find(|(applies, _)| applies(pct))
        .map(|(_, render)| render(ctx))
        .unwrap_or_default()
}

fn select_overall_message(pct: f64, ctx: &OverallContext) -> String {
    OVERALL_RULES
        .iter()
        .find(|(applies, _)| applies(pct))
        .map(|(_, render)| render(ctx))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_config() -> InsightConfig {
        // Low thresholds so small fixtures trigger every band
        InsightConfig {
            category_change_pct: 1.0,
            overall_trend_pct: 1.0,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 15, 12, 0, 0).unwrap()
    }

    fn expense(category: Category, amount: f64, month: u32) -> Transaction {
        Transaction {
            id: 0,
            user_id: 1,
            description: "e".to_string(),
            amount,
            category,
            tx_type: TransactionType::Expense,
            date: Utc.with_ymd_and_hms(2023, month, 10, 8, 0, 0).unwrap(),
            created_at: Utc.with_ymd_and_hms(2023, month, 10, 8, 0, 0).unwrap(),
        }
    }

    fn income(amount: f64, month: u32) -> Transaction {
        Transaction {
            tx_type: TransactionType::Income,
            ..expense(Category::Other, amount, month)
        }
    }

    #[test]
    fn test_no_transactions_ever_yields_single_info() {
        let insights = derive(&[], &[], 0, now(), &test_config());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Info);
        assert_eq!(insights[0].message, "No transactions found in your account.");
    }

    #[test]
    fn test_history_but_empty_month_yields_single_info() {
        let insights = derive(&[], &[], 12, now(), &test_config());
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Info);
        assert_eq!(
            insights[0].message,
            "No transactions found for the current month (June 2023)."
        );
        assert!(insights[0].details.contains("12 total transactions"));
    }

    #[test]
    fn test_new_category_counts_as_hundred_percent_spike() {
        let current = vec![expense(Category::Food, 100.0, 6)];
        let insights = derive(&current, &[], 1, now(), &test_config());

        let food = insights
            .iter()
            .find(|i| i.category == Some(Category::Food))
            .unwrap();
        assert_eq!(food.kind, InsightKind::CategoryChange);
        assert_eq!(food.percentage_change, Some(100));
        assert!(food.message.contains("spiked by 100% in June"));
        assert!(food.message.contains("$0.00 in May"));
    }

    #[test]
    fn test_exact_twenty_percent_increase_reads_as_less() {
        // +20% misses the "more" band (strictly greater than 20) and falls
        // to the catch-all, which phrases it as "less"
        let current = vec![expense(Category::Transport, 120.0, 6)];
        let previous = vec![expense(Category::Transport, 100.0, 5)];
        let insights = derive(&current, &previous, 2, now(), &test_config());

        let transport = insights
            .iter()
            .find(|i| i.category == Some(Category::Transport))
            .unwrap();
        assert_eq!(transport.percentage_change, Some(20));
        assert!(
            transport.message.contains("20% less on transport"),
            "unexpected message: {}",
            transport.message
        );
    }

    #[test]
    fn test_moderate_increase_uses_more_phrasing() {
        let current = vec![expense(Category::Food, 130.0, 6)];
        let previous = vec![expense(Category::Food, 100.0, 5)];
        let insights = derive(&current, &previous, 2, now(), &test_config());

        let food = insights
            .iter()
            .find(|i| i.category == Some(Category::Food))
            .unwrap();
        assert!(food.message.contains("30% more on food"));
    }

    #[test]
    fn test_deep_cut_uses_saving_phrasing() {
        let current = vec![expense(Category::Entertainment, 20.0, 6)];
        let previous = vec![expense(Category::Entertainment, 100.0, 5)];
        let insights = derive(&current, &previous, 2, now(), &test_config());

        let ent = insights
            .iter()
            .find(|i| i.category == Some(Category::Entertainment))
            .unwrap();
        assert_eq!(ent.percentage_change, Some(-80));
        assert!(ent.message.contains("cut your entertainment spending by 80%"));
        assert!(ent.message.contains("saving $80.00"));
    }

    #[test]
    fn test_previous_only_categories_are_not_visited() {
        let current = vec![expense(Category::Transport, 50.0, 6)];
        let previous = vec![
            expense(Category::Transport, 50.0, 5),
            expense(Category::Food, 500.0, 5),
        ];
        let insights = derive(&current, &previous, 3, now(), &test_config());
        assert!(insights.iter().all(|i| i.category != Some(Category::Food)));
    }

    #[test]
    fn test_overall_trend_halved_spending_recovers_saved_amount() {
        let current = vec![expense(Category::Food, 50.0, 6)];
        let previous = vec![expense(Category::Food, 100.0, 5)];
        let insights = derive(&current, &previous, 2, now(), &test_config());

        let overall = insights
            .iter()
            .find(|i| i.kind == InsightKind::OverallTrend)
            .unwrap();
        assert_eq!(overall.percentage_change, Some(-50));
        assert!(overall.message.contains("reduced your overall spending by 50%"));
        assert!(overall.message.contains("saving $50.00"));
    }

    #[test]
    fn test_overall_trend_all_spending_eliminated_has_defined_saved_amount() {
        // Income keeps the month non-empty while expenses drop to zero,
        // which is the -100% edge of the saved-amount recovery
        let current = vec![income(2000.0, 6)];
        let previous = vec![expense(Category::Food, 300.0, 5)];
        let insights = derive(&current, &previous, 2, now(), &test_config());

        let overall = insights
            .iter()
            .find(|i| i.kind == InsightKind::OverallTrend)
            .unwrap();
        assert_eq!(overall.percentage_change, Some(-100));
        assert!(
            overall.message.contains("saving $300.00"),
            "unexpected message: {}",
            overall.message
        );
    }

    #[test]
    fn test_overall_trend_significant_increase() {
        let current = vec![expense(Category::Food, 200.0, 6)];
        let previous = vec![expense(Category::Food, 100.0, 5)];
        let insights = derive(&current, &previous, 2, now(), &test_config());

        let overall = insights
            .iter()
            .find(|i| i.kind == InsightKind::OverallTrend)
            .unwrap();
        assert!(overall
            .message
            .contains("increased significantly by 100% this month"));
        assert!(overall.message.contains("$200.00"));
    }

    #[test]
    fn test_quiet_month_falls_back_to_info() {
        // Identical months: every change is 0%, below even the test
        // thresholds, so the fallback info insight fires
        let current = vec![expense(Category::Food, 100.0, 6)];
        let previous = vec![expense(Category::Food, 100.0, 5)];
        let insights = derive(&current, &previous, 2, now(), &test_config());

        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Info);
        assert!(insights[0]
            .message
            .contains("Found 1 transactions in current month"));
        assert!(insights[0].details.contains("$100.00"));
    }

    #[test]
    fn test_production_thresholds_gate_small_changes() {
        // +15% on a category is invisible at the default 20% threshold,
        // but the overall trend still fires at its 10% threshold
        let current = vec![expense(Category::Food, 115.0, 6)];
        let previous = vec![expense(Category::Food, 100.0, 5)];
        let insights = derive(&current, &previous, 2, now(), &InsightConfig::default());

        assert!(insights.iter().all(|i| i.kind != InsightKind::CategoryChange));
        assert!(insights.iter().any(|i| i.kind == InsightKind::OverallTrend));
    }

    #[test]
    fn test_income_never_contributes_to_spending() {
        let current = vec![income(5000.0, 6), expense(Category::Food, 100.0, 6)];
        let previous = vec![expense(Category::Food, 100.0, 5)];
        let insights = derive(&current, &previous, 3, now(), &test_config());

        // Income is invisible: both months spent $100, so only the
        // fallback info insight appears
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].kind, InsightKind::Info);
    }
}
