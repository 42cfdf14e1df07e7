/*!
 * Configuration Module
 *
 * Handles application configuration loading from environment variables
 * and provides structured access to configuration values. Config is
 * validated eagerly at startup (encryption key length, signing secret
 * length, listen port range) so a misconfigured deployment fails fast
 * rather than misbehaving at request time.
 */

use anyhow::{bail, Context};
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub security: SecurityConfig,
    pub business: BusinessConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsSettings,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host address (e.g., "0.0.0.0"); empty or "localhost" binds 0.0.0.0
    pub host: String,
    pub port: u16,
    /// "development" or "production" — drives log format and CORS/security defaults
    pub environment: String,
    /// Set when a reverse proxy terminates TLS in front of this service;
    /// gates the HSTS response header. This service
    /// never terminates TLS itself.
    pub behind_tls_proxy: bool,
}

impl ServerConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Resolved bind host: binds 0.0.0.0 when host is empty or "localhost".
    pub fn bind_host(&self) -> &str {
        if self.host.is_empty() || self.host.eq_ignore_ascii_case("localhost") {
            "0.0.0.0"
        } else {
            &self.host
        }
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
}

/// JWT configuration — a single signing secret for both access and refresh
/// tokens, at least 32 characters.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Access token lifetime in hours (default 24)
    pub access_token_hours: i64,
    /// Refresh token lifetime is always 7x the access token lifetime
    pub refresh_token_hours: i64,
    pub issuer: String,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("access_token_hours", &self.access_token_hours)
            .field("refresh_token_hours", &self.refresh_token_hours)
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Security configuration
#[derive(Clone)]
pub struct SecurityConfig {
    /// AES-256 encryption key for encrypted customer fields (32 raw bytes)
    pub encryption_key: String,
    /// Argon2 work factor (time cost)
    pub argon2_time_cost: u32,
    pub max_failed_login_attempts: u32,
    pub lockout_minutes: i64,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("encryption_key", &"[REDACTED]")
            .field("argon2_time_cost", &self.argon2_time_cost)
            .field("max_failed_login_attempts", &self.max_failed_login_attempts)
            .field("lockout_minutes", &self.lockout_minutes)
            .finish()
    }
}

/// Business-rule configuration (pricing and cart lifetime)
#[derive(Debug, Clone)]
pub struct BusinessConfig {
    pub tax_rate: f64,
    pub delivery_fee: f64,
    pub cart_ttl_hours: i64,
    pub guest_session_hours: i64,
}

/// Per-client-IP token-bucket rate limiting configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub rate_per_second: u32,
    pub burst: u32,
}

/// CORS configuration sourced from the environment
#[derive(Debug, Clone)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing, or
    /// if a loaded value fails validation (key length, secret length, port
    /// range). Bootstrap treats this as a fatal, exit-1 condition.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            server: ServerConfig {
                host: std::env::var("SERVER_HOST").unwrap_or_default(),
                port: std::env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .context("SERVER_PORT must be a valid port number")?,
                environment: std::env::var("ENVIRONMENT")
                    .unwrap_or_else(|_| "development".to_string()),
                behind_tls_proxy: std::env::var("BEHIND_TLS_PROXY")
                    .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                    .unwrap_or(false),
            },

            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
                max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .unwrap_or(20),
                min_connections: std::env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
                acquire_timeout: Duration::from_secs(
                    std::env::var("DATABASE_CONNECT_TIMEOUT")
                        .unwrap_or_else(|_| "30".to_string())
                        .parse()
                        .unwrap_or(30),
                ),
                idle_timeout: Duration::from_secs(
                    std::env::var("DATABASE_IDLE_TIMEOUT")
                        .unwrap_or_else(|_| "600".to_string())
                        .parse()
                        .unwrap_or(600),
                ),
                max_lifetime: Duration::from_secs(
                    std::env::var("DATABASE_MAX_LIFETIME")
                        .unwrap_or_else(|_| "1800".to_string())
                        .parse()
                        .unwrap_or(1800),
                ),
            },

            jwt: JwtConfig {
                secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
                access_token_hours: std::env::var("JWT_ACCESS_TOKEN_HOURS")
                    .unwrap_or_else(|_| "24".to_string())
                    .parse()
                    .unwrap_or(24),
                refresh_token_hours: std::env::var("JWT_ACCESS_TOKEN_HOURS")
                    .unwrap_or_else(|_| "24".to_string())
                    .parse()
                    .map(|h: i64| h * 7)
                    .unwrap_or(168),
                issuer: std::env::var("JWT_ISSUER")
                    .unwrap_or_else(|_| "pharmacy-backend".to_string()),
            },

            security: SecurityConfig {
                encryption_key: std::env::var("ENCRYPTION_KEY")
                    .context("ENCRYPTION_KEY must be set")?,
                argon2_time_cost: std::env::var("ARGON2_TIME_COST")
                    .unwrap_or_else(|_| "12".to_string())
                    .parse()
                    .unwrap_or(12),
                max_failed_login_attempts: std::env::var("MAX_LOGIN_ATTEMPTS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .unwrap_or(5),
                lockout_minutes: std::env::var("LOCKOUT_MINUTES")
                    .unwrap_or_else(|_| "15".to_string())
                    .parse()
                    .unwrap_or(15),
            },

            business: BusinessConfig {
                tax_rate: std::env::var("TAX_RATE")
                    .unwrap_or_else(|_| "0.12".to_string())
                    .parse()
                    .unwrap_or(0.12),
                delivery_fee: std::env::var("DELIVERY_FEE")
                    .unwrap_or_else(|_| "50.00".to_string())
                    .parse()
                    .unwrap_or(50.00),
                cart_ttl_hours: std::env::var("CART_TTL_HOURS")
                    .unwrap_or_else(|_| "24".to_string())
                    .parse()
                    .unwrap_or(24),
                guest_session_hours: std::env::var("GUEST_SESSION_HOURS")
                    .unwrap_or_else(|_| "72".to_string())
                    .parse()
                    .unwrap_or(72),
            },

            rate_limit: RateLimitConfig {
                rate_per_second: std::env::var("RATE_LIMIT_RPS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                burst: std::env::var("RATE_LIMIT_BURST")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .unwrap_or(20),
            },

            cors: CorsSettings {
                allowed_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_default()
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Fail-fast structural validation, run once at bootstrap.
    fn validate(&self) -> anyhow::Result<()> {
        if self.security.encryption_key.len() != 32 {
            bail!(
                "ENCRYPTION_KEY must be exactly 32 bytes, got {} bytes",
                self.security.encryption_key.len()
            );
        }

        if self.jwt.secret.len() < 32 {
            bail!(
                "JWT_SECRET must be at least 32 characters, got {} characters",
                self.jwt.secret.len()
            );
        }

        if self.server.port == 0 {
            bail!("SERVER_PORT must be a non-zero port number");
        }

        if self.is_production() && self.cors.allowed_origins.is_empty() {
            tracing::warn!(
                "production environment with no CORS_ALLOWED_ORIGINS configured: \
                 requests from any origin will be rejected unless the deployer sets this"
            );
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
