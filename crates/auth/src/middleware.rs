use axum::{
    extract::{Request, State},
    http::header,
    middleware::{self, Next},
    response::Response,
    Router,
};
use jobportal_core::Role;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AuthError;
use crate::jwt::{verify_token, Claims, JwtConfig};

/// Authenticated user context that gets inserted into request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub subject: String,
    pub role: Role,
}

impl AuthUser {
    /// The subject as a user id. Tokens minted by this service always carry one.
    pub fn user_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.subject).map_err(|_| AuthError::InvalidToken)
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            subject: claims.sub,
            role: claims.role,
        }
    }
}

/// Pull the token out of an `Authorization` header value.
///
/// A leading `Bearer` scheme is stripped when present; a bare token is accepted
/// as is. A scheme with nothing after it counts as no token at all.
pub fn extract_bearer(header_value: &str) -> Option<&str> {
    let value = header_value.trim();
    let token = match value.strip_prefix("Bearer") {
        Some("") => "",
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => value,
    };
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Validate a raw `Authorization` header value and return the verified claims
pub fn authenticate(config: &JwtConfig, header_value: Option<&str>) -> Result<Claims, AuthError> {
    let token = header_value
        .and_then(extract_bearer)
        .ok_or(AuthError::MissingToken)?;

    verify_token(config, token)
}

/// Set of roles permitted through a guard. A single role is the one-element case.
#[derive(Debug, Clone)]
pub struct AllowedRoles(Arc<[Role]>);

impl AllowedRoles {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self(roles.into_iter().collect())
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn roles(&self) -> &[Role] {
        &self.0
    }
}

impl From<Role> for AllowedRoles {
    fn from(role: Role) -> Self {
        Self::new([role])
    }
}

impl<const N: usize> From<[Role; N]> for AllowedRoles {
    fn from(roles: [Role; N]) -> Self {
        Self::new(roles)
    }
}

impl From<&[Role]> for AllowedRoles {
    fn from(roles: &[Role]) -> Self {
        Self::new(roles.iter().copied())
    }
}

/// Allow iff the user's role is in `allowed`
pub fn authorize(auth_user: &AuthUser, allowed: &AllowedRoles) -> Result<(), AuthError> {
    if allowed.contains(auth_user.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Helper function to require the admin role inside a handler
pub fn require_admin(auth_user: &AuthUser) -> Result<(), AuthError> {
    authorize(auth_user, &AllowedRoles::from(Role::Admin))
}

/// Authentication middleware (JWT only, no DB check)
///
/// Token is read from the Authorization header only. The verified identity
/// is inserted into the request extensions as `AuthUser`.
pub async fn auth_middleware(
    State(config): State<Arc<JwtConfig>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // A header that is present but not visible ASCII is a bad credential, not a missing one
    let header_value = match req.headers().get(header::AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| {
            tracing::warn!("Rejected request to {}: non-ASCII Authorization header", req.uri().path());
            AuthError::InvalidToken
        })?),
        None => None,
    };

    let claims = authenticate(&config, header_value).map_err(|e| {
        tracing::warn!("Rejected request to {}: {}", req.uri().path(), e);
        e
    })?;

    req.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(req).await)
}

/// Role check. Only reachable through `AccessGuard`, which always layers
/// `auth_middleware` outside it.
async fn role_middleware(
    State(allowed): State<AllowedRoles>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(auth_user) = req.extensions().get::<AuthUser>() else {
        tracing::error!("Role guard reached without an authenticated user on {}", req.uri().path());
        return Err(AuthError::MissingToken);
    };

    if let Err(e) = authorize(auth_user, &allowed) {
        tracing::warn!(
            "Role {} not permitted on {} (allowed: {:?})",
            auth_user.role,
            req.uri().path(),
            allowed.roles()
        );
        return Err(e);
    }

    Ok(next.run(req).await)
}

/// Composes the guards onto routers.
///
/// Authentication always wraps authorization, so a role check can never
/// run without a verified identity. Apply after the routes are added.
#[derive(Debug, Clone)]
pub struct AccessGuard {
    config: Arc<JwtConfig>,
}

impl AccessGuard {
    pub fn new(config: Arc<JwtConfig>) -> Self {
        Self { config }
    }

    /// Require a valid token on every route of `router`
    pub fn authenticated<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.route_layer(middleware::from_fn_with_state(
            self.config.clone(),
            auth_middleware,
        ))
    }

    /// Require a valid token whose role is in `roles` on every route of `router`
    pub fn with_roles<S>(&self, router: Router<S>, roles: impl Into<AllowedRoles>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let router = router.route_layer(middleware::from_fn_with_state(
            roles.into(),
            role_middleware,
        ));
        self.authenticated(router)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::generate_token;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::get,
        Extension,
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    fn config() -> JwtConfig {
        JwtConfig::new("middleware-test-secret-at-least-32-chars", Duration::from_secs(3600)).unwrap()
    }

    fn user(role: Role) -> AuthUser {
        AuthUser { subject: "u1".to_string(), role }
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(authenticate(&config(), None), Err(AuthError::MissingToken));
        assert_eq!(authenticate(&config(), Some("")), Err(AuthError::MissingToken));
        assert_eq!(authenticate(&config(), Some("Bearer ")), Err(AuthError::MissingToken));
        // hyper trims trailing whitespace, so `Bearer ` arrives as `Bearer`
        assert_eq!(authenticate(&config(), Some("Bearer")), Err(AuthError::MissingToken));
        assert_eq!(authenticate(&config(), Some("  Bearer\t ")), Err(AuthError::MissingToken));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer("Bearer   abc.def  "), Some("abc.def"));
        assert_eq!(extract_bearer("abc.def"), Some("abc.def"));
        // Only the whole word is a scheme
        assert_eq!(extract_bearer("Bearerabc"), Some("Bearerabc"));
        assert_eq!(extract_bearer("Bearer"), None);
    }

    #[test]
    fn test_bearer_prefix_is_optional() {
        let config = config();
        let token = generate_token(&config, "u1", Role::Employer).unwrap();

        let with_prefix = authenticate(&config, Some(&format!("Bearer {}", token))).unwrap();
        let without_prefix = authenticate(&config, Some(&token)).unwrap();

        assert_eq!(with_prefix, without_prefix);
        assert_eq!(with_prefix.sub, "u1");
        assert_eq!(with_prefix.role, Role::Employer);
    }

    #[test]
    fn test_malformed_token_is_invalid() {
        let config = config();
        assert_eq!(authenticate(&config, Some("Bearer garbage")), Err(AuthError::InvalidToken));
        assert_eq!(authenticate(&config, Some("Basic dXNlcjpwYXNz")), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_authorize_role_sets() {
        assert_eq!(authorize(&user(Role::Employer), &Role::Employer.into()), Ok(()));
        assert_eq!(
            authorize(&user(Role::Jobseeker), &Role::Employer.into()),
            Err(AuthError::Forbidden)
        );

        let staff = AllowedRoles::from([Role::Employer, Role::Admin]);
        assert!(authorize(&user(Role::Admin), &staff).is_ok());
        assert!(authorize(&user(Role::Employer), &staff).is_ok());
        assert_eq!(authorize(&user(Role::Jobseeker), &staff), Err(AuthError::Forbidden));

        let nobody = AllowedRoles::new(std::iter::empty());
        assert_eq!(authorize(&user(Role::Admin), &nobody), Err(AuthError::Forbidden));
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(&user(Role::Admin)).is_ok());
        assert_eq!(require_admin(&user(Role::Employer)), Err(AuthError::Forbidden));
    }

    #[test]
    fn test_issue_authenticate_authorize_scenario() {
        let config = config();
        let token = generate_token(&config, "u1", Role::Employer).unwrap();

        let claims = authenticate(&config, Some(&format!("Bearer {}", token))).unwrap();
        let auth_user = AuthUser::from(claims);
        assert_eq!(auth_user.subject, "u1");

        assert!(authorize(&auth_user, &Role::Employer.into()).is_ok());
        assert_eq!(authorize(&auth_user, &Role::Admin.into()), Err(AuthError::Forbidden));
    }

    #[test]
    fn test_user_id_requires_uuid_subject() {
        assert_eq!(user(Role::Admin).user_id(), Err(AuthError::InvalidToken));

        let id = Uuid::new_v4();
        let auth_user = AuthUser { subject: id.to_string(), role: Role::Admin };
        assert_eq!(auth_user.user_id(), Ok(id));
    }

    async fn whoami(Extension(auth): Extension<AuthUser>) -> String {
        format!("{}:{}", auth.subject, auth.role)
    }

    fn app(config: Arc<JwtConfig>) -> Router {
        let guard = AccessGuard::new(config);
        let any_user = guard.authenticated(Router::new().route("/me", get(whoami)));
        let employers = guard.with_roles(Router::new().route("/post", get(whoami)), Role::Employer);
        let admins = guard.with_roles(Router::new().route("/admin", get(whoami)), [Role::Admin]);
        Router::new()
            .route("/public", get(|| async { "open" }))
            .merge(any_user)
            .merge(employers)
            .merge(admins)
    }

    async fn send(app: Router, path: &str, auth: Option<String>) -> (StatusCode, Vec<u8>) {
        let mut builder = HttpRequest::builder().uri(path);
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
        (status, body)
    }

    fn message(body: &[u8]) -> String {
        let value: Value = serde_json::from_slice(body).unwrap();
        value["message"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_guarded_router() {
        let config = Arc::new(config());
        let employer = generate_token(&config, "u1", Role::Employer).unwrap();

        let (status, body) = send(app(config.clone()), "/public", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"open");

        let (status, body) = send(app(config.clone()), "/me", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message(&body), "Access Denied");

        let (status, body) = send(app(config.clone()), "/me", Some("Bearer nope".to_string())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message(&body), "Invalid token");

        let (status, body) = send(app(config.clone()), "/me", Some(employer.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"u1:employer");

        let (status, _) = send(app(config.clone()), "/post", Some(format!("Bearer {}", employer))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(app(config.clone()), "/admin", Some(format!("Bearer {}", employer))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(message(&body), "Forbidden");

        // Role guard never sees an unauthenticated request
        let (status, _) = send(app(config), "/admin", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_ascii_header_is_invalid_not_missing() {
        let request = HttpRequest::builder()
            .uri("/me")
            .header(
                header::AUTHORIZATION,
                header::HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap(),
            )
            .body(Body::empty())
            .unwrap();

        let response = app(Arc::new(config())).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(message(&body), "Invalid token");
    }

    #[tokio::test]
    async fn test_bare_scheme_is_missing_token() {
        let (status, body) = send(app(Arc::new(config())), "/me", Some("Bearer".to_string())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message(&body), "Access Denied");
    }

    #[tokio::test]
    async fn test_token_from_other_secret_rejected_by_router() {
        let config = Arc::new(config());
        let foreign = JwtConfig::new("some-other-service-secret-value-xyz", Duration::from_secs(3600)).unwrap();
        let token = generate_token(&foreign, "u1", Role::Admin).unwrap();

        let (status, body) = send(app(config), "/admin", Some(format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message(&body), "Invalid token");
    }
}
