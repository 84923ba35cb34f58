//! Tally Web Server
//!
//! Axum-based REST API for the Tally personal finance tracker.
//!
//! - JWT bearer authentication on every route except registration, login,
//!   password reset, and the health check
//! - Restrictive CORS policy (same-origin unless origins are configured)
//! - Request tracing and sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Validation};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use tally_core::analytics::InsightConfig;
use tally_core::db::Database;
use tally_core::mailer::Mailer;
use tally_core::models::User;

mod handlers;
mod scheduler;

pub use scheduler::{run_monthly_reports, start_report_scheduler, ReportScheduleConfig};

/// Environment variable holding the JWT signing secret
pub const JWT_SECRET_ENV: &str = "TALLY_JWT_SECRET";

/// How long issued tokens stay valid
const TOKEN_TTL_HOURS: i64 = 24;

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Secret used to sign and verify session tokens
    pub jwt_secret: String,
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Base URL that password-reset links point at
    pub client_base_url: String,
}

impl ServerConfig {
    /// Build configuration from environment variables.
    ///
    /// Without `TALLY_JWT_SECRET` a random per-process secret is used, so
    /// sessions do not survive a restart.
    pub fn from_env() -> Self {
        let jwt_secret = match std::env::var(JWT_SECRET_ENV) {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                warn!(
                    "{} not set; using a random secret, sessions will not survive restarts",
                    JWT_SECRET_ENV
                );
                tally_core::password::generate_reset_token()
            }
        };

        let allowed_origins = std::env::var("TALLY_ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let client_base_url = std::env::var("TALLY_CLIENT_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());

        Self {
            jwt_secret,
            allowed_origins,
            client_base_url,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    /// None when SMTP is not configured; reset emails degrade gracefully
    pub mailer: Option<Mailer>,
    /// Insight thresholds (tunable, injected into the engine per request)
    pub insights: InsightConfig,
}

/// Token claims: subject is the user id
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i64,
    exp: i64,
}

/// Issue a session token for a user
pub fn create_token(secret: &str, user_id: i64, now: DateTime<Utc>) -> Result<String, AppError> {
    let claims = Claims {
        sub: user_id,
        exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::internal(&format!("Failed to sign token: {}", e)))
}

/// Validate a session token and return the user id it names
fn decode_token(secret: &str, token: &str) -> Result<i64, jsonwebtoken::errors::Error> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims.sub)
}

/// Authenticated user attached to the request by the auth middleware
#[derive(Clone)]
pub struct AuthUser(pub User);

/// Authentication middleware - validates the Bearer token and loads the
/// user onto the request
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "));

    let Some(token) = token else {
        return unauthorized("No token, authorization denied");
    };

    let user_id = match decode_token(&state.config.jwt_secret, token) {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, path = %request.uri().path(), "Rejected invalid token");
            return unauthorized("Token is not valid");
        }
    };

    match state.db.get_user(user_id) {
        Ok(Some(user)) => {
            request.extensions_mut().insert(AuthUser(user));
            next.run(request).await
        }
        Ok(None) => unauthorized("User not found, authorization denied"),
        Err(e) => {
            error!(error = %e, "Failed to load user during auth");
            AppError::internal("An internal error occurred").into_response()
        }
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "message": message })),
    )
        .into_response()
}

/// Create the application router
pub fn create_router(db: Database, config: ServerConfig) -> Router {
    let mailer = Mailer::from_env();
    match &mailer {
        Some(m) => info!("SMTP configured: {}", m.host()),
        None => info!("SMTP not configured (set TALLY_SMTP_HOST to enable email)"),
    }

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        mailer,
        insights: InsightConfig::default(),
    });

    let public_routes = Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/forgot-password", post(handlers::forgot_password))
        .route("/auth/reset-password", post(handlers::reset_password))
        .route("/health", get(handlers::health));

    let protected_routes = Router::new()
        // Auth
        .route("/auth/verify", get(handlers::verify))
        .route("/user/update", put(handlers::update_profile))
        // Transactions
        .route(
            "/transactions",
            post(handlers::create_transaction).get(handlers::list_transactions),
        )
        .route(
            "/transactions/:id",
            get(handlers::get_transaction)
                .put(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        // Dashboard
        .route("/dashboard/summary", get(handlers::dashboard_summary))
        .route("/dashboard/time-data", get(handlers::dashboard_time_data))
        // Insights
        .route("/insights", get(handlers::get_insights))
        .route(
            "/insights/categories/:category",
            get(handlers::get_category_insights),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the server
pub async fn serve(db: Database, host: &str, port: u16, config: ServerConfig) -> anyhow::Result<()> {
    // Start the monthly report scheduler if configured
    if let Some(schedule) = ReportScheduleConfig::from_env() {
        start_report_scheduler(db.clone(), schedule);
    }

    let app = create_router(db, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "message": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
