//! Transaction operations

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{fmt_datetime, parse_datetime, Database};
use crate::error::Result;
use crate::models::{Category, NewTransaction, Transaction, TransactionType};

fn map_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    let category: String = row.get(4)?;
    let tx_type: String = row.get(5)?;
    let date: String = row.get(6)?;
    let created_at: String = row.get(7)?;

    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        category: category.parse().unwrap_or(Category::Other),
        tx_type: tx_type.parse().unwrap_or(TransactionType::Expense),
        date: parse_datetime(&date),
        created_at: parse_datetime(&created_at),
    })
}

const TX_COLUMNS: &str = "id, user_id, description, amount, category, type, date, created_at";

impl Database {
    /// Insert a transaction for a user at the given instant
    pub fn insert_transaction(
        &self,
        user_id: i64,
        tx: &NewTransaction,
        date: DateTime<Utc>,
    ) -> Result<Transaction> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO transactions (user_id, description, amount, category, type, date)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                tx.description,
                tx.amount,
                tx.category.as_str(),
                tx.tx_type.as_str(),
                fmt_datetime(date),
            ],
        )?;

        let id = conn.last_insert_rowid();
        drop(conn);

        // Read back so created_at reflects what SQLite stamped
        self.get_transaction(user_id, id)?
            .ok_or_else(|| crate::error::Error::NotFound(format!("Transaction {} not found", id)))
    }

    /// Fetch transactions for a user, newest first, with optional
    /// half-open UTC date range `[start, end)` and type filter.
    pub fn find_transactions(
        &self,
        user_id: i64,
        date_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
        tx_type: Option<TransactionType>,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;

        let mut conditions = vec!["user_id = ?".to_string()];
        let mut query_params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];

        if let Some((start, end)) = date_range {
            conditions.push("date >= ? AND date < ?".to_string());
            query_params.push(Box::new(fmt_datetime(start)));
            query_params.push(Box::new(fmt_datetime(end)));
        }

        if let Some(t) = tx_type {
            conditions.push("type = ?".to_string());
            query_params.push(Box::new(t.as_str()));
        }

        let sql = format!(
            "SELECT {} FROM transactions WHERE {} ORDER BY date DESC, id DESC",
            TX_COLUMNS,
            conditions.join(" AND ")
        );

        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> =
            query_params.iter().map(|p| p.as_ref()).collect();

        let transactions = stmt
            .query_map(param_refs.as_slice(), map_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Search a user's transactions by substring on description or
    /// category (case-insensitive), newest first.
    pub fn search_transactions(
        &self,
        user_id: i64,
        search: Option<&str>,
    ) -> Result<Vec<Transaction>> {
        let query = search.map(str::trim).filter(|q| !q.is_empty());

        let Some(q) = query else {
            return self.find_transactions(user_id, None, None);
        };

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            r#"
            SELECT {} FROM transactions
            WHERE user_id = ?
              AND (description LIKE ? COLLATE NOCASE OR category LIKE ? COLLATE NOCASE)
            ORDER BY date DESC, id DESC
            "#,
            TX_COLUMNS
        ))?;

        let pattern = format!("%{}%", q);
        let transactions = stmt
            .query_map(params![user_id, pattern, pattern], map_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    /// Fetch a single transaction, scoped to its owner
    pub fn get_transaction(&self, user_id: i64, id: i64) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let tx = conn
            .query_row(
                &format!(
                    "SELECT {} FROM transactions WHERE id = ? AND user_id = ?",
                    TX_COLUMNS
                ),
                params![id, user_id],
                map_transaction,
            )
            .optional()?;
        Ok(tx)
    }

    /// Replace all editable fields of a transaction. The date is refreshed
    /// to the given instant. Returns None when the transaction does not
    /// exist or belongs to another user.
    pub fn update_transaction(
        &self,
        user_id: i64,
        id: i64,
        tx: &NewTransaction,
        date: DateTime<Utc>,
    ) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE transactions
            SET description = ?, amount = ?, category = ?, type = ?, date = ?
            WHERE id = ? AND user_id = ?
            "#,
            params![
                tx.description,
                tx.amount,
                tx.category.as_str(),
                tx.tx_type.as_str(),
                fmt_datetime(date),
                id,
                user_id,
            ],
        )?;

        if updated == 0 {
            return Ok(None);
        }
        drop(conn);
        self.get_transaction(user_id, id)
    }

    /// Delete a transaction, scoped to its owner. Returns false when
    /// nothing was deleted.
    pub fn delete_transaction(&self, user_id: i64, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM transactions WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }
}
