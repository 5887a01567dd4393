use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use axum_extra::extract::WithRejection;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;
use crate::error::ApiError;
use crate::AppState;
use jobportal_auth::{require_admin, AuthUser};
use jobportal_core::models::{CreateJobInput, Job, UpdateJobInput};
use jobportal_core::RepoError;

fn require_non_blank(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        Err(ApiError::BadRequest(format!("{} must not be empty", field)))
    } else {
        Ok(())
    }
}

fn validate_salary(salary: Option<i64>) -> Result<(), ApiError> {
    match salary {
        Some(s) if s < 0 => Err(ApiError::BadRequest("salary must not be negative".to_string())),
        _ => Ok(()),
    }
}

async fn load_job(state: &AppState, id: Uuid) -> Result<Job, ApiError> {
    state.jobs.get_job(id).await.map_err(|e| match e {
        RepoError::NotFound => ApiError::NotFound("Job not found".to_string()),
        other => other.into(),
    })
}

/// Employers may only manage their own postings; admins may manage any
fn ensure_can_manage(auth: &AuthUser, job: &Job) -> Result<(), ApiError> {
    if auth.user_id()? == job.employer_id {
        return Ok(());
    }
    require_admin(auth).map_err(|e| {
        tracing::warn!("User {} tried to modify job {} owned by {}", auth.subject, job.id, job.employer_id);
        ApiError::from(e)
    })
}

/// List job postings
/// GET /api/jobs
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Job>>, ApiError> {
    let jobs = state.jobs.list_jobs().await?;
    Ok(Json(jobs))
}

/// Get a single job posting
/// GET /api/jobs/{id}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<Job>, ApiError> {
    let job = load_job(&state, id).await?;
    Ok(Json(job))
}

/// Create a job posting
/// POST /api/jobs
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(input), _): WithRejection<Json<CreateJobInput>, ApiError>,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    require_non_blank("title", &input.title)?;
    require_non_blank("description", &input.description)?;
    require_non_blank("company", &input.company)?;
    validate_salary(input.salary)?;

    let employer_id = auth.user_id()?;
    let job = state.jobs.create_job(employer_id, input).await.map_err(|e| match e {
        // Token outlived the account it was issued for
        RepoError::NotFound => {
            tracing::warn!("Job post rejected, user {} no longer exists", employer_id);
            ApiError::Unauthorized("Account no longer exists".to_string())
        }
        other => other.into(),
    })?;

    tracing::info!("Job {} created by {}", job.id, employer_id);

    Ok((StatusCode::CREATED, Json(job)))
}

/// Update a job posting
/// PUT /api/jobs/{id}
pub async fn update_job(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
    WithRejection(Json(input), _): WithRejection<Json<UpdateJobInput>, ApiError>,
) -> Result<Json<Job>, ApiError> {
    if input.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }
    if let Some(title) = &input.title {
        require_non_blank("title", title)?;
    }
    if let Some(description) = &input.description {
        require_non_blank("description", description)?;
    }
    if let Some(company) = &input.company {
        require_non_blank("company", company)?;
    }
    validate_salary(input.salary)?;

    let job = load_job(&state, id).await?;
    ensure_can_manage(&auth, &job)?;

    let job = state.jobs.update_job(id, input).await?;

    Ok(Json(job))
}

/// Delete a job posting
/// DELETE /api/jobs/{id}
pub async fn delete_job(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, ApiError>,
) -> Result<Json<Value>, ApiError> {
    let job = load_job(&state, id).await?;
    ensure_can_manage(&auth, &job)?;

    state.jobs.delete_job(id).await?;

    tracing::info!("Job {} deleted by {}", id, auth.subject);

    Ok(Json(json!({"message": "Job deleted"})))
}
