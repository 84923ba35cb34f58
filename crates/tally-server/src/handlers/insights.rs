//! Insight handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::{AppError, AppState, AuthUser};
use tally_core::analytics;
use tally_core::models::Insight;

#[derive(Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<Insight>,
    pub generated_at: String,
    pub count: usize,
}

/// GET /api/insights - Month-over-month spending insights
pub async fn get_insights(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<InsightsResponse>, AppError> {
    let now = Utc::now();
    let insights = analytics::user_insights(&state.db, user.id, now, &state.insights)?;

    Ok(Json(InsightsResponse {
        count: insights.len(),
        insights,
        generated_at: now.to_rfc3339(),
    }))
}

#[derive(Serialize)]
pub struct CategoryInsightsResponse {
    pub insights: Vec<Insight>,
    pub category: String,
    pub count: usize,
}

/// GET /api/insights/categories/:category - Insights for one category
pub async fn get_category_insights(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(category): Path<String>,
) -> Result<Json<CategoryInsightsResponse>, AppError> {
    let insights = analytics::user_insights(&state.db, user.id, Utc::now(), &state.insights)?;

    let filtered: Vec<Insight> = insights
        .into_iter()
        .filter(|i| {
            i.category
                .map(|c| c.as_str().eq_ignore_ascii_case(&category))
                .unwrap_or(false)
        })
        .collect();

    Ok(Json(CategoryInsightsResponse {
        count: filtered.len(),
        insights: filtered,
        category,
    }))
}
