//! Dashboard summary aggregation
//!
//! A pure reduction over a user's transaction set: no clock, no store, no
//! side effects.

use crate::models::{CategoryTotal, MonthlyStats, Summary, Transaction, TransactionType};

/// Aggregate totals, a five-item recent preview, and the per-category
/// expense breakdown. Income transactions never contribute to categories.
/// Empty input yields an all-zero summary.
pub fn summarize(transactions: &[Transaction]) -> Summary {
    let mut total_income = 0.0;
    let mut total_expense = 0.0;
    let mut categories: Vec<CategoryTotal> = Vec::new();

    for tx in transactions {
        match tx.tx_type {
            TransactionType::Income => {
                total_income += tx.amount;
            }
            TransactionType::Expense => {
                total_expense += tx.amount;
                match categories.iter_mut().find(|c| c.category == tx.category) {
                    Some(entry) => entry.amount += tx.amount,
                    None => categories.push(CategoryTotal {
                        category: tx.category,
                        amount: tx.amount,
                    }),
                }
            }
        }
    }

    // Preview is always sorted here rather than trusting caller order
    let mut recent: Vec<Transaction> = transactions.to_vec();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent.truncate(5);

    Summary {
        total_income,
        total_expense,
        balance: total_income - total_expense,
        recent_transactions: recent,
        // The monthly block mirrors the overall totals; the dashboard
        // issues no separate month-bounded query.
        monthly_stats: MonthlyStats {
            income: total_income,
            expense: total_expense,
        },
        expense_categories: categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use chrono::{TimeZone, Utc};

    fn tx(
        id: i64,
        amount: f64,
        category: Category,
        tx_type: TransactionType,
        day: u32,
    ) -> Transaction {
        Transaction {
            id,
            user_id: 1,
            description: format!("tx {}", id),
            amount,
            category,
            tx_type,
            date: Utc.with_ymd_and_hms(2023, 6, day, 12, 0, 0).unwrap(),
            created_at: Utc.with_ymd_and_hms(2023, 6, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_input_yields_zero_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_income, 0.0);
        assert_eq!(summary.total_expense, 0.0);
        assert_eq!(summary.balance, 0.0);
        assert!(summary.recent_transactions.is_empty());
        assert!(summary.expense_categories.is_empty());
    }

    #[test]
    fn test_balance_is_income_minus_expense() {
        let txs = vec![
            tx(1, 1000.0, Category::Other, TransactionType::Income, 1),
            tx(2, 250.5, Category::Food, TransactionType::Expense, 2),
            tx(3, 99.49, Category::Transport, TransactionType::Expense, 3),
        ];
        let summary = summarize(&txs);
        assert!((summary.balance - (summary.total_income - summary.total_expense)).abs() < 1e-9);
        assert!((summary.balance - 650.01).abs() < 1e-9);
    }

    #[test]
    fn test_balance_can_go_negative() {
        let txs = vec![
            tx(1, 100.0, Category::Other, TransactionType::Income, 1),
            tx(2, 300.0, Category::Food, TransactionType::Expense, 2),
        ];
        assert!((summarize(&txs).balance - (-200.0)).abs() < 1e-9);
    }

    #[test]
    fn test_categories_exclude_income_and_sum_to_total_expense() {
        let txs = vec![
            tx(1, 5000.0, Category::Other, TransactionType::Income, 1),
            tx(2, 40.0, Category::Food, TransactionType::Expense, 2),
            tx(3, 60.0, Category::Food, TransactionType::Expense, 3),
            tx(4, 15.0, Category::Entertainment, TransactionType::Expense, 4),
        ];
        let summary = summarize(&txs);

        let category_sum: f64 = summary.expense_categories.iter().map(|c| c.amount).sum();
        assert!((category_sum - summary.total_expense).abs() < 1e-9);

        assert_eq!(summary.expense_categories.len(), 2);
        let food = summary
            .expense_categories
            .iter()
            .find(|c| c.category == Category::Food)
            .unwrap();
        assert!((food.amount - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_recent_preview_is_newest_first_capped_at_five() {
        let txs: Vec<Transaction> = (1..=8)
            .map(|i| tx(i, 10.0, Category::Food, TransactionType::Expense, i as u32))
            .collect();
        let summary = summarize(&txs);

        assert_eq!(summary.recent_transactions.len(), 5);
        assert_eq!(summary.recent_transactions[0].id, 8);
        assert_eq!(summary.recent_transactions[4].id, 4);
    }

    #[test]
    fn test_monthly_stats_mirror_totals() {
        let txs = vec![
            tx(1, 700.0, Category::Other, TransactionType::Income, 1),
            tx(2, 120.0, Category::Utilities, TransactionType::Expense, 2),
        ];
        let summary = summarize(&txs);
        assert!((summary.monthly_stats.income - summary.total_income).abs() < 1e-9);
        assert!((summary.monthly_stats.expense - summary.total_expense).abs() < 1e-9);
    }
}
