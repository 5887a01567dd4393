//! JWT Token Generation and Verification
//!
//! Security features:
//! - No hardcoded fallback secrets; an empty secret is refused at construction
//! - Issuer and audience validation
//! - Support for key rotation (primary + secondary secret)
//! - Token lifetime is configuration, not a literal

use jobportal_core::Role;
use jsonwebtoken::{
    decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::error::AuthError;

const DEFAULT_ISSUER: &str = "jobportal";
const DEFAULT_AUDIENCE: &str = "jobportal-api";
const DEFAULT_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

/// JWT signing and validation settings, shared read-only by every request
#[derive(Clone)]
pub struct JwtConfig {
    /// Primary JWT secret (required)
    secret: String,
    /// Secondary JWT secret for key rotation (optional)
    secret_secondary: Option<String>,
    issuer: String,
    audience: String,
    /// Token lifetime in seconds
    expiry_secs: u64,
    /// Clock-skew tolerance applied to `exp`
    leeway_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("secret_secondary", &self.secret_secondary.as_ref().map(|_| "<redacted>"))
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiry_secs", &self.expiry_secs)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

impl JwtConfig {
    /// Build a config from an explicit secret and token lifetime.
    ///
    /// Fails with `AuthError::Signing` if the secret is empty.
    pub fn new(secret: impl Into<String>, expiry: Duration) -> Result<Self, AuthError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(AuthError::Signing("JWT secret must not be empty".to_string()));
        }

        Ok(Self {
            secret,
            secret_secondary: None,
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            expiry_secs: expiry.as_secs(),
            leeway_secs: 0,
        })
    }

    /// Load configuration from the environment.
    ///
    /// `JWT_SECRET` is required; everything else has a default.
    pub fn from_env() -> Result<Self, AuthError> {
        let secret = env::var("JWT_SECRET").map_err(|_| {
            AuthError::Signing(
                "JWT_SECRET environment variable is required. \
                Set JWT_SECRET to a secure random string (at least 32 characters)"
                    .to_string(),
            )
        })?;
        if !secret.is_empty() && secret.len() < 32 {
            tracing::warn!("JWT_SECRET is less than 32 characters - consider using a longer secret");
        }

        let expiry_secs = parse_secs_var("JWT_EXPIRY_SECS", DEFAULT_EXPIRY_SECS);
        let mut config = Self::new(secret, Duration::from_secs(expiry_secs))?;

        // Secondary secret for key rotation (optional)
        if let Some(secondary) = env::var("JWT_SECRET_SECONDARY").ok().filter(|s| !s.is_empty()) {
            tracing::info!("JWT key rotation enabled: secondary secret configured");
            config = config.with_secondary_secret(secondary);
        }
        if let Ok(issuer) = env::var("JWT_ISSUER") {
            config = config.with_issuer(issuer);
        }
        if let Ok(audience) = env::var("JWT_AUDIENCE") {
            config = config.with_audience(audience);
        }
        config = config.with_leeway(Duration::from_secs(parse_secs_var("JWT_LEEWAY_SECS", 0)));

        tracing::info!(
            "JWT configured: issuer={}, audience={}, expiry={}s, leeway={}s",
            config.issuer, config.audience, config.expiry_secs, config.leeway_secs
        );

        Ok(config)
    }

    pub fn with_secondary_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret_secondary = Some(secret.into()).filter(|s| !s.is_empty());
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway_secs = leeway.as_secs();
        self
    }

    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_secs)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation
    }
}

fn parse_secs_var(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {}={:?}, using default {}s", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Role recorded for the subject at issuance
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Issue a signed token for an already-authenticated subject
pub fn generate_token(config: &JwtConfig, subject: &str, role: Role) -> Result<String, AuthError> {
    generate_token_at(config, subject, role, get_current_timestamp())
}

/// Issue a token as if the current time were `issued_at`
pub fn generate_token_at(
    config: &JwtConfig,
    subject: &str,
    role: Role,
    issued_at: u64,
) -> Result<String, AuthError> {
    if config.secret.is_empty() {
        return Err(AuthError::Signing("JWT secret is not configured".to_string()));
    }

    let claims = Claims {
        sub: subject.to_string(),
        role,
        exp: issued_at.saturating_add(config.expiry_secs),
        iat: issued_at,
        iss: Some(config.issuer.clone()),
        aud: Some(config.audience.clone()),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AuthError::Signing(e.to_string()))
}

/// Verify and decode a JWT token
///
/// Validates:
/// - Signature (tries primary secret, then secondary for rotation)
/// - Expiration time
/// - Issuer and audience
///
/// Every failure is reported as `AuthError::InvalidToken`.
pub fn verify_token(config: &JwtConfig, token: &str) -> Result<Claims, AuthError> {
    let validation = config.validation();

    let claims = match decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    ) {
        Ok(token_data) => token_data.claims,
        Err(primary_err) => {
            let secondary = config.secret_secondary.as_ref().and_then(|secondary| {
                decode::<Claims>(
                    token,
                    &DecodingKey::from_secret(secondary.as_bytes()),
                    &validation,
                )
                .ok()
            });
            match secondary {
                Some(token_data) => {
                    tracing::debug!("Token validated with secondary secret (key rotation)");
                    token_data.claims
                }
                None => {
                    tracing::debug!("JWT decode error: {:?}", primary_err);
                    return Err(AuthError::InvalidToken);
                }
            }
        }
    };

    // A token is dead from the second its expiry is reached
    if get_current_timestamp() >= claims.exp.saturating_add(config.leeway_secs) {
        tracing::debug!("JWT expired for subject {}", claims.sub);
        return Err(AuthError::InvalidToken);
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-for-unit-tests-only-32chars";

    fn config() -> JwtConfig {
        JwtConfig::new(SECRET, Duration::from_secs(3600)).unwrap()
    }

    #[test]
    fn test_token_roundtrip() {
        let config = config();
        let token = generate_token(&config, "u1", Role::Employer).expect("Failed to generate token");

        let claims = verify_token(&config, &token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.role, Role::Employer);
        assert_eq!(claims.exp, claims.iat + 3600);
        assert_eq!(claims.iss.as_deref(), Some("jobportal"));
        assert_eq!(claims.aud.as_deref(), Some("jobportal-api"));
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        assert!(matches!(
            JwtConfig::new("", Duration::from_secs(3600)),
            Err(AuthError::Signing(_))
        ));
        assert!(matches!(
            JwtConfig::new("   ", Duration::from_secs(3600)),
            Err(AuthError::Signing(_))
        ));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = generate_token(&config(), "u1", Role::Admin).unwrap();
        let other = JwtConfig::new("a-completely-different-secret-value", Duration::from_secs(3600)).unwrap();

        assert_eq!(verify_token(&other, &token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_expired_token_is_invalid() {
        let config = config();
        let two_hours_ago = get_current_timestamp() - 7200;
        let token = generate_token_at(&config, "u1", Role::Jobseeker, two_hours_ago).unwrap();

        assert_eq!(verify_token(&config, &token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_token_expiring_now_is_invalid() {
        let config = config();
        let issued_at = get_current_timestamp() - 3600;
        let token = generate_token_at(&config, "u1", Role::Jobseeker, issued_at).unwrap();

        assert_eq!(verify_token(&config, &token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_leeway_accepts_recently_expired_token() {
        let config = config().with_leeway(Duration::from_secs(300));
        let issued_at = get_current_timestamp() - 3660;
        let token = generate_token_at(&config, "u1", Role::Jobseeker, issued_at).unwrap();

        assert!(verify_token(&config, &token).is_ok());
    }

    #[test]
    fn test_issuer_and_audience_mismatch() {
        let config = config();
        let token = generate_token(&config, "u1", Role::Employer).unwrap();

        let other_issuer = config.clone().with_issuer("someone-else");
        assert_eq!(verify_token(&other_issuer, &token), Err(AuthError::InvalidToken));

        let other_audience = config.with_audience("another-api");
        assert_eq!(verify_token(&other_audience, &token), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_secondary_secret_for_rotation() {
        let old = JwtConfig::new("old-secret-that-is-being-rotated-out", Duration::from_secs(3600)).unwrap();
        let token = generate_token(&old, "u1", Role::Admin).unwrap();

        let rotated = config();
        assert_eq!(verify_token(&rotated, &token), Err(AuthError::InvalidToken));

        let rotated = rotated.with_secondary_secret("old-secret-that-is-being-rotated-out");
        let claims = verify_token(&rotated, &token).unwrap();
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        let config = config();
        assert_eq!(verify_token(&config, "not-a-jwt"), Err(AuthError::InvalidToken));
        assert_eq!(verify_token(&config, "a.b.c"), Err(AuthError::InvalidToken));
        assert_eq!(verify_token(&config, ""), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains(SECRET));
        assert!(rendered.contains("<redacted>"));
    }
}
