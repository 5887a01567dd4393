//! Repository layer for users and job postings
//!
//! Handlers talk to storage only through the `UserRepository` and
//! `JobRepository` traits. `PgRepository` is the PostgreSQL implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CreateJobInput, Job, NewUser, UpdateJobInput, User};

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Resource not found")]
    NotFound,
    #[error("Resource already exists")]
    Conflict,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// User lookup and persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Insert a new user. Fails with `RepoError::Conflict` if the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError>;

    async fn list_users(&self) -> Result<Vec<User>, RepoError>;
}

/// Job posting persistence
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// All postings, newest first
    async fn list_jobs(&self) -> Result<Vec<Job>, RepoError>;

    async fn get_job(&self, id: Uuid) -> Result<Job, RepoError>;

    /// Fails with `RepoError::NotFound` if `employer_id` has no user row
    async fn create_job(&self, employer_id: Uuid, input: CreateJobInput) -> Result<Job, RepoError>;

    async fn update_job(&self, id: Uuid, input: UpdateJobInput) -> Result<Job, RepoError>;

    async fn delete_job(&self, id: Uuid) -> Result<(), RepoError>;
}

/// PostgreSQL-backed repository
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Unique violations become `Conflict`; a dangling foreign key means the
/// referenced row is gone, so `NotFound`.
fn map_constraint_violation(e: sqlx::Error) -> RepoError {
    match e.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => RepoError::Conflict,
        Some(db_err) if db_err.is_foreign_key_violation() => RepoError::NotFound,
        _ => RepoError::Database(e),
    }
}

#[async_trait]
impl UserRepository for PgRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1)"
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint_violation)
    }

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }
}

#[async_trait]
impl JobRepository for PgRepository {
    async fn list_jobs(&self) -> Result<Vec<Job>, RepoError> {
        let jobs = sqlx::query_as::<_, Job>("SELECT * FROM jobs ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(jobs)
    }

    async fn get_job(&self, id: Uuid) -> Result<Job, RepoError> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn create_job(&self, employer_id: Uuid, input: CreateJobInput) -> Result<Job, RepoError> {
        sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (id, title, description, company, location, salary, employer_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#
        )
        .bind(Uuid::new_v4())
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.company)
        .bind(&input.location)
        .bind(input.salary)
        .bind(employer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint_violation)
    }

    async fn update_job(&self, id: Uuid, input: UpdateJobInput) -> Result<Job, RepoError> {
        if input.is_empty() {
            return Err(RepoError::InvalidInput("No fields to update".to_string()));
        }

        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                company = COALESCE($4, company),
                location = COALESCE($5, location),
                salary = COALESCE($6, salary),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#
        )
        .bind(id)
        .bind(input.title)
        .bind(input.description)
        .bind(input.company)
        .bind(input.location)
        .bind(input.salary)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepoError::NotFound)
    }

    async fn delete_job(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            Err(RepoError::NotFound)
        } else {
            Ok(())
        }
    }
}
