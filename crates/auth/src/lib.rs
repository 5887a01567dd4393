pub mod error;
pub mod jwt;
pub mod middleware;

// Re-export commonly used items
pub use error::AuthError;

pub use middleware::{
    auth_middleware,
    authenticate,
    authorize,
    extract_bearer,
    require_admin,
    AccessGuard,
    AllowedRoles,
    AuthUser,
};

pub use jwt::{
    generate_token,
    verify_token,
    Claims,
    JwtConfig,
};
