pub mod models;
pub mod repository;

pub use models::Role;
pub use repository::{JobRepository, PgRepository, RepoError, UserRepository};
