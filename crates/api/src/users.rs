use axum::{
    extract::State,
    response::Json,
    Extension,
};
use std::sync::Arc;
use crate::error::ApiError;
use crate::AppState;
use jobportal_auth::AuthUser;
use jobportal_core::models::User;

/// List all users (admin only, enforced by the router guard)
/// GET /api/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.users.list_users().await?;

    tracing::debug!("Admin {} listed {} users", auth.subject, users.len());

    Ok(Json(users))
}
