use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    Extension,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use std::sync::Arc;
use crate::error::ApiError;
use crate::password::{hash_password, verify_password};
use crate::AppState;
use jobportal_auth::{generate_token, AuthUser};
use jobportal_core::models::{LoginInput, NewUser, RegisterInput, User};
use jobportal_core::RepoError;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Register a new account
/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(input), _): WithRejection<Json<RegisterInput>, ApiError>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let username = input.username.trim().to_string();
    let email = input.email.trim().to_lowercase();

    if username.is_empty() || email.is_empty() || input.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username, email and password are required".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }

    // Check whether the email is already registered
    if state.users.find_by_email(&email).await?.is_some() {
        return Err(ApiError::BadRequest("User already exists".to_string()));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?;

    let user = state.users
        .create_user(NewUser {
            username,
            email,
            password_hash,
            role: input.role.unwrap_or_default(),
        })
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent registration for the same email
            RepoError::Conflict => ApiError::BadRequest("User already exists".to_string()),
            other => other.into(),
        })?;

    tracing::info!("Registered user {} with role {}", user.id, user.role);

    Ok((StatusCode::CREATED, Json(user)))
}

/// Login endpoint
/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(input), _): WithRejection<Json<LoginInput>, ApiError>,
) -> Result<Json<Value>, ApiError> {
    let email = input.email.trim().to_lowercase();

    let user = match state.users.find_by_email(&email).await? {
        Some(u) => u,
        None => {
            tracing::warn!("Failed login: no account for {}", email);
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
    };

    if !verify_password(&input.password, &user.password_hash) {
        tracing::warn!("Failed login: wrong password for user {}", user.id);
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = generate_token(&state.jwt, &user.id.to_string(), user.role)?;

    tracing::info!("User {} logged in", user.id);

    Ok(Json(json!({
        "token": token,
        "token_type": "Bearer",
        "expires_in": state.jwt.expiry().as_secs(),
        "user": user,
    })))
}

/// Identity carried by the caller's token
/// GET /api/auth/me
pub async fn me(
    Extension(auth): Extension<AuthUser>,
) -> Json<Value> {
    Json(json!({
        "subject": auth.subject,
        "role": auth.role,
    }))
}
