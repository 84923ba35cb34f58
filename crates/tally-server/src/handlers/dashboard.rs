//! Dashboard handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{AppError, AppState, AuthUser};
use tally_core::analytics;
use tally_core::models::{Period, Summary, TimeSeries};

/// GET /api/dashboard/summary - Totals, recent preview, category breakdown
pub async fn dashboard_summary(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Summary>, AppError> {
    let summary = analytics::dashboard_summary(&state.db, user.id)?;
    Ok(Json(summary))
}

/// Query parameters for chart data
#[derive(Debug, Deserialize)]
pub struct TimeDataQuery {
    /// "weekly" or "monthly"; anything else means monthly
    pub period: Option<String>,
}

/// GET /api/dashboard/time-data - Bucketed chart data
pub async fn dashboard_time_data(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Query(params): Query<TimeDataQuery>,
) -> Result<Json<TimeSeries>, AppError> {
    let period = Period::from_query(params.period.as_deref());
    let series = analytics::time_series(&state.db, user.id, period, Utc::now())?;
    Ok(Json(series))
}
