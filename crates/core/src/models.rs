use serde::{Deserialize, Deserializer, Serialize};
use sqlx::types::{chrono::{DateTime, Utc}, Uuid};
use std::fmt;
use std::str::FromStr;

/// Deserialize an optional role where an empty string means "not provided"
fn deserialize_optional_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s.parse::<Role>()
            .map(Some)
            .map_err(|e| D::Error::custom(e.to_string())),
    }
}

// ==================== Role ====================

/// Account role, recorded on the user and embedded in every issued token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    #[default]
    Jobseeker,
    Employer,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Jobseeker, Role::Employer, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Jobseeker => "jobseeker",
            Role::Employer => "employer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jobseeker" => Ok(Role::Jobseeker),
            "employer" => Ok(Role::Employer),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

// ==================== User ====================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default, deserialize_with = "deserialize_optional_role")]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// A validated, already-hashed user ready to be persisted
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

// ==================== Job ====================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub company: String,
    pub location: Option<String>,
    pub salary: Option<i64>,
    pub employer_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobInput {
    pub title: String,
    pub description: String,
    pub company: String,
    pub location: Option<String>,
    pub salary: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateJobInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<i64>,
}

impl UpdateJobInput {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.company.is_none()
            && self.location.is_none()
            && self.salary.is_none()
    }

    /// Apply the provided fields onto an existing posting
    pub fn apply_to(self, job: &mut Job) {
        if let Some(title) = self.title {
            job.title = title;
        }
        if let Some(description) = self.description {
            job.description = description;
        }
        if let Some(company) = self.company {
            job.company = company;
        }
        if let Some(location) = self.location {
            job.location = Some(location);
        }
        if let Some(salary) = self.salary {
            job.salary = Some(salary);
        }
    }
}
