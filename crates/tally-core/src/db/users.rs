//! User account operations

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{fmt_datetime, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::User;

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let reset_expires: Option<String> = row.get(5)?;
    let created_at: String = row.get(6)?;

    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        password_reset_token: row.get(4)?,
        password_reset_expires: reset_expires.map(|s| parse_datetime(&s)),
        created_at: parse_datetime(&created_at),
    })
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, password_reset_token, password_reset_expires, created_at";

impl Database {
    /// Create a user. The email must be unique; callers are expected to
    /// store it lowercased.
    pub fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO users (name, email, password_hash) VALUES (?, ?, ?)",
            params![name, email, password_hash],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::InvalidData(format!("User already exists with email {}", email))
            }
            other => other.into(),
        })?;

        Ok(conn.last_insert_rowid())
    }

    /// Fetch a user by id
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                params![id],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Fetch a user by email (case-insensitive)
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!(
                    "SELECT {} FROM users WHERE email = ? COLLATE NOCASE",
                    USER_COLUMNS
                ),
                params![email],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// List all users (used by the monthly report job)
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))?;

        let users = stmt
            .query_map([], map_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Update a user's display name. Returns the updated user, or None if
    /// the id does not exist.
    pub fn update_user_name(&self, id: i64, name: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE users SET name = ? WHERE id = ?",
            params![name, id],
        )?;

        if updated == 0 {
            return Ok(None);
        }
        self.get_user(id)
    }

    /// Store a password-reset token with its expiry on the account with
    /// the given email. Returns the user, or None if no account matches.
    pub fn set_password_reset(
        &self,
        email: &str,
        token: &str,
        expires: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE users SET password_reset_token = ?, password_reset_expires = ? WHERE email = ? COLLATE NOCASE",
            params![token, fmt_datetime(expires), email],
        )?;

        if updated == 0 {
            return Ok(None);
        }
        self.get_user_by_email(email)
    }

    /// Consume a reset token: if the email/token pair matches and the token
    /// has not expired at `now`, set the new password hash and clear the
    /// token. Returns false when no row matched.
    pub fn reset_password(
        &self,
        email: &str,
        token: &str,
        now: DateTime<Utc>,
        new_password_hash: &str,
    ) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE users
            SET password_hash = ?,
                password_reset_token = NULL,
                password_reset_expires = NULL
            WHERE email = ? COLLATE NOCASE
              AND password_reset_token = ?
              AND password_reset_expires > ?
            "#,
            params![new_password_hash, email, token, fmt_datetime(now)],
        )?;

        Ok(updated > 0)
    }
}
