//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod auth;
pub mod dashboard;
pub mod insights;
pub mod transactions;

// Re-export all handlers for use in router
pub use auth::*;
pub use dashboard::*;
pub use insights::*;
pub use transactions::*;

use axum::Json;

/// GET /api/health - Liveness check
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
