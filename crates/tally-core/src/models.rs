//! Domain models for Tally

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user account
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Expense categories (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Transport,
    Utilities,
    Entertainment,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Transport => "transport",
            Self::Utilities => "utilities",
            Self::Entertainment => "entertainment",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "food" => Ok(Self::Food),
            "transport" => Ok(Self::Transport),
            "utilities" => Ok(Self::Utilities),
            "entertainment" => Ok(Self::Entertainment),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a transaction adds to or subtracts from the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A financial transaction. Amounts are never negative; the sign of the
/// contribution to the balance comes from `tx_type`.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    pub amount: f64,
    pub category: Category,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    /// Stored and compared as a UTC instant
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when creating or replacing a transaction.
/// The server stamps the date itself.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub description: String,
    pub amount: f64,
    pub category: Category,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
}

/// Summed expenses for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MonthlyStats {
    pub income: f64,
    pub expense: f64,
}

/// Dashboard summary over a user's full transaction history
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_income: f64,
    pub total_expense: f64,
    pub balance: f64,
    pub recent_transactions: Vec<Transaction>,
    pub monthly_stats: MonthlyStats,
    pub expense_categories: Vec<CategoryTotal>,
}

/// Chart period selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Weekly,
    Monthly,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Capitalized form used in time-series payloads
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
        }
    }

    /// Unknown period strings fall back to monthly rather than erroring
    pub fn from_query(s: Option<&str>) -> Period {
        match s {
            Some(s) if s.eq_ignore_ascii_case("weekly") => Self::Weekly,
            _ => Self::Monthly,
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-day chart totals for the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct TimeSeries {
    pub labels: Vec<String>,
    pub income: Vec<f64>,
    pub expenses: Vec<f64>,
    pub summary: TimeSeriesSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeSeriesSummary {
    pub total_income: f64,
    pub total_expense: f64,
    pub period: String,
}

/// Kind of generated spending insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    CategoryChange,
    OverallTrend,
    Info,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CategoryChange => "category_change",
            Self::OverallTrend => "overall_trend",
            Self::Info => "info",
        }
    }
}

/// A natural-language observation about spending change.
/// Built fresh per request, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage_change: Option<i64>,
}
