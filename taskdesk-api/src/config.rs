/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `PRODUCTION`: Enables `Secure` cookies and HSTS (default: false)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: none)
/// - `STATIC_DIR`: Directory served under `/static` (default: static)
/// - `DATABASE_URL`: SQLite connection string (default: sqlite://taskdesk.db)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 5)
/// - `SESSION_SECRET`: Key for signing session tokens (required, 32+ chars)
/// - `SESSION_TTL_HOURS`: Session lifetime (default: 168)
/// - `UPLOAD_DIR`: Attachment directory (default: uploads)
/// - `MAX_BODY_BYTES`: Request body ceiling (default: 10485760)
/// - `RUST_LOG`: Log filter (default: taskdesk_api=debug,taskdesk_shared=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use taskdesk_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, str::FromStr};

/// Default request body ceiling (10 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Minimum accepted length of `SESSION_SECRET`
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted session lifetime (one year)
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Session configuration
    pub session: SessionConfig,

    /// Attachment upload configuration
    pub upload: UploadConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Production mode (HTTPS-only cookies, HSTS)
    pub production: bool,

    /// Allowed CORS origins; empty means same-origin only
    pub cors_origins: Vec<String>,

    /// Page assets served under `/static`
    pub static_dir: PathBuf,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Secret key for signing session tokens
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub secret: String,

    /// Session lifetime in hours
    pub ttl_hours: i64,
}

/// Attachment upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory attachments are written to
    pub dir: PathBuf,

    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,
}

impl SessionConfig {
    /// Session lifetime
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ttl_hours)
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `SESSION_SECRET` is missing or shorter than 32 characters
    /// - A numeric or boolean variable has an invalid value
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let session_secret = env::var("SESSION_SECRET")
            .map_err(|_| anyhow::anyhow!("SESSION_SECRET environment variable is required"))?;

        if session_secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("SESSION_SECRET must be at least {MIN_SECRET_LEN} characters long");
        }

        let ttl_hours = check_ttl_hours(parse_var("SESSION_TTL_HOURS", 168)?)?;

        Ok(Self {
            api: ApiConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_var("API_PORT", 8080)?,
                production: parse_var("PRODUCTION", false)?,
                cors_origins: parse_origins(&env::var("CORS_ORIGINS").unwrap_or_default()),
                static_dir: env::var("STATIC_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("static")),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite://taskdesk.db".to_string()),
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 5)?,
            },
            session: SessionConfig {
                secret: session_secret,
                ttl_hours,
            },
            upload: UploadConfig {
                dir: env::var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("uploads")),
                max_body_bytes: parse_var("MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{name} has an invalid value {raw:?}: {e}")),
        _ => Ok(default),
    }
}

fn check_ttl_hours(hours: i64) -> anyhow::Result<i64> {
    if !(1..=MAX_SESSION_TTL_HOURS).contains(&hours) {
        anyhow::bail!("SESSION_TTL_HOURS must be between 1 and {MAX_SESSION_TTL_HOURS}, got {hours}");
    }
    Ok(hours)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
