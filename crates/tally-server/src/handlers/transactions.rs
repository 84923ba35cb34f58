//! Transaction handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{AppError, AppState, AuthUser};
use tally_core::models::{NewTransaction, Transaction};

use super::auth::MessageResponse;

fn validate_transaction(tx: &NewTransaction) -> Result<(), AppError> {
    if tx.description.trim().is_empty() {
        return Err(AppError::bad_request("Description is required"));
    }
    if !tx.amount.is_finite() || tx.amount < 0.0 {
        return Err(AppError::bad_request("Amount must be a non-negative number"));
    }
    Ok(())
}

/// POST /api/transactions - Create a transaction
///
/// The date is stamped server-side so stored instants are consistent.
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(req): Json<NewTransaction>,
) -> Result<(StatusCode, Json<Transaction>), AppError> {
    validate_transaction(&req)?;

    let tx = state.db.insert_transaction(user.id, &req, Utc::now())?;
    Ok((StatusCode::CREATED, Json(tx)))
}

/// Query parameters for listing transactions
#[derive(Debug, Deserialize)]
pub struct TransactionQuery {
    /// Case-insensitive substring over description and category
    pub search: Option<String>,
}

/// GET /api/transactions - List the user's transactions, newest first
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(params): Query<TransactionQuery>,
) -> Result<Json<Vec<Transaction>>, AppError> {
    let transactions = state
        .db
        .search_transactions(user.id, params.search.as_deref())?;
    Ok(Json(transactions))
}

/// GET /api/transactions/:id - Fetch one transaction
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<Transaction>, AppError> {
    let tx = state
        .db
        .get_transaction(user.id, id)?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;
    Ok(Json(tx))
}

/// PUT /api/transactions/:id - Replace a transaction's fields
///
/// All fields are required; the stored date is refreshed to now.
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<NewTransaction>,
) -> Result<Json<Transaction>, AppError> {
    validate_transaction(&req)?;

    let tx = state
        .db
        .update_transaction(user.id, id, &req, Utc::now())?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;
    Ok(Json(tx))
}

/// DELETE /api/transactions/:id - Delete a transaction
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    let deleted = state.db.delete_transaction(user.id, id)?;
    if !deleted {
        return Err(AppError::not_found("Transaction not found"));
    }

    Ok(Json(MessageResponse {
        message: "Transaction deleted successfully".to_string(),
    }))
}
