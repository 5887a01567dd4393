use jobportal_auth::{AuthError, JwtConfig};
use std::net::SocketAddr;
use std::str::FromStr;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("JWT configuration error: {0}")]
    Jwt(#[from] AuthError),
}

/// Service configuration, read from the environment at startup
#[derive(Debug)]
pub struct Config {
    /// PostgreSQL connection string
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        Ok(Self {
            database_url,
            bind_addr: parse_or_default(
                "BIND_ADDR",
                std::env::var("BIND_ADDR").ok(),
                SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            )?,
            db_max_connections: parse_or_default(
                "DB_MAX_CONNECTIONS",
                std::env::var("DB_MAX_CONNECTIONS").ok(),
                DEFAULT_DB_MAX_CONNECTIONS,
            )?,
            jwt: JwtConfig::from_env()?,
        })
    }
}

/// Parse an optional raw value, falling back to `default` when unset or blank
fn parse_or_default<T: FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            name,
            value: value.to_string(),
        }),
    }
}
