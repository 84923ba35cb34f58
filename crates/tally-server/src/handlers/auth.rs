//! Authentication and account handlers

use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{create_token, AppError, AppState, AuthUser};
use tally_core::password::{generate_reset_token, hash_password, verify_password};

/// Public view of a user for auth responses
#[derive(Serialize)]
pub struct UserInfo {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl From<&tally_core::models::User> for UserInfo {
    fn from(user: &tally_core::models::User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

fn validate_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.len() < 2 {
        return Err(AppError::bad_request("Name must be at least 2 characters long"));
    }
    if name.len() > 50 {
        return Err(AppError::bad_request("Name must be less than 50 characters"));
    }
    Ok(name)
}

/// Same shape the frontend enforces: something@something.tld, no spaces
fn validate_email(email: &str) -> Result<String, AppError> {
    static EMAIL_RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    let re = EMAIL_RE
        .get_or_init(|| regex::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

    let email = email.trim();
    if !re.is_match(email) {
        return Err(AppError::bad_request("Please enter a valid email address"));
    }
    Ok(email.to_lowercase())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 6 {
        return Err(AppError::bad_request(
            "Password must be at least 6 characters long",
        ));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: RegisteredUser,
}

#[derive(Serialize)]
pub struct RegisteredUser {
    pub name: String,
    pub email: String,
}

/// POST /api/auth/register - Create an account
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let name = validate_name(&req.name)?;
    let email = validate_email(&req.email)?;
    validate_password(&req.password)?;

    if state.db.get_user_by_email(&email)?.is_some() {
        return Err(AppError::bad_request("User already exists with this email"));
    }

    let password_hash = hash_password(&req.password)?;
    state.db.create_user(name, &email, &password_hash)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: RegisteredUser {
                name: name.to_string(),
                email,
            },
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// POST /api/auth/login - Exchange credentials for a session token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = req.email.trim().to_lowercase();

    // A missing user and a bad password are indistinguishable to the caller
    let user = state
        .db
        .get_user_by_email(&email)?
        .filter(|u| verify_password(&req.password, &u.password_hash))
        .ok_or_else(|| AppError::bad_request("Invalid email or password"))?;

    let token = create_token(&state.config.jwt_secret, user.id, Utc::now())?;

    Ok(Json(LoginResponse {
        token,
        user: UserInfo::from(&user),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct ForgotPasswordResponse {
    pub message: String,
    /// Only present when mail is not configured, so the flow stays
    /// usable in development
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

/// POST /api/auth/forgot-password - Issue a reset token (and email it)
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, AppError> {
    let email = validate_email(&req.email)?;

    let token = generate_reset_token();
    let expires = Utc::now() + Duration::hours(1);

    let user = state
        .db
        .set_password_reset(&email, &token, expires)?
        .ok_or_else(|| {
            AppError::not_found("Account doesn't exist with this email. Please register first.")
        })?;

    let Some(mailer) = &state.mailer else {
        warn!("Mail not configured; returning reset token in response");
        return Ok(Json(ForgotPasswordResponse {
            message: "Email service not configured. Use the reset token directly.".to_string(),
            reset_token: Some(token),
        }));
    };

    let reset_url = format!(
        "{}?token={}&email={}",
        state.config.client_base_url, token, user.email
    );
    mailer
        .send_password_reset(&user.email, &reset_url)
        .map_err(|e| {
            warn!(error = %e, "Failed to send reset email");
            AppError::internal("Unable to send reset email. Please try again later.")
        })?;

    Ok(Json(ForgotPasswordResponse {
        message: "Password reset email sent successfully. Please check your inbox.".to_string(),
        reset_token: None,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub token: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/auth/reset-password - Consume a reset token
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = validate_email(&req.email)?;
    validate_password(&req.new_password)?;

    let new_hash = hash_password(&req.new_password)?;
    let reset = state
        .db
        .reset_password(&email, &req.token, Utc::now(), &new_hash)?;

    if !reset {
        return Err(AppError::bad_request(
            "Invalid or expired reset token. Please request a new password reset.",
        ));
    }

    Ok(Json(MessageResponse {
        message: "Password reset successfully. You can now login with your new password."
            .to_string(),
    }))
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user: UserInfo,
}

/// GET /api/auth/verify - Return the authenticated user
pub async fn verify(Extension(AuthUser(user)): Extension<AuthUser>) -> Json<UserResponse> {
    Json(UserResponse {
        user: UserInfo::from(&user),
    })
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
}

/// PUT /api/user/update - Rename the authenticated user
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let name = validate_name(&req.name)?;

    let updated = state
        .db
        .update_user_name(user.id, name)?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(UserResponse {
        user: UserInfo::from(&updated),
    }))
}
