use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failure modes of the authentication and authorization pipeline.
///
/// Malformed, badly signed and expired tokens all collapse into
/// `InvalidToken` so callers never learn which check failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Access Denied")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Forbidden")]
    Forbidden,
    #[error("Token signing failed: {0}")]
    Signing(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message exposed to clients
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Signing(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let AuthError::Signing(ref reason) = self {
            tracing::error!("Token signing error: {}", reason);
        }
        (
            self.status_code(),
            Json(json!({ "message": self.public_message() })),
        )
            .into_response()
    }
}
