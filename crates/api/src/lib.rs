pub mod auth_handlers;
pub mod config;
pub mod error;
pub mod jobs;
pub mod password;
pub mod users;

use axum::{
    response::Json,
    routing::{get, post, put},
    Router,
};
use jobportal_auth::{AccessGuard, JwtConfig};
use jobportal_core::{JobRepository, Role, UserRepository};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Shared application state. Read-only after startup.
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub jwt: Arc<JwtConfig>,
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Build the HTTP router with every guard in place
pub fn router(state: Arc<AppState>) -> Router {
    let guard = AccessGuard::new(state.jwt.clone());

    let public = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(auth_handlers::register))
        .route("/api/auth/login", post(auth_handlers::login))
        .route("/api/jobs", get(jobs::list_jobs))
        .route("/api/jobs/{id}", get(jobs::get_job));

    let any_user = guard.authenticated(
        Router::new().route("/api/auth/me", get(auth_handlers::me)),
    );

    let admin = guard.with_roles(
        Router::new().route("/api/users", get(users::list_users)),
        Role::Admin,
    );

    let employers = guard.with_roles(
        Router::new()
            .route("/api/jobs", post(jobs::create_job))
            .route("/api/jobs/{id}", put(jobs::update_job).delete(jobs::delete_job)),
        [Role::Employer, Role::Admin],
    );

    Router::new()
        .merge(public)
        .merge(any_user)
        .merge(admin)
        .merge(employers)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
