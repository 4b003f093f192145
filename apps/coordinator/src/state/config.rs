// [apps/coordinator/src/state/config.rs]
//! Typed startup configuration for the coordinator, read once from the
//! environment via `std::env::var`, matching the host's existing `main.rs`
//! style of reading `DATABASE_URL`/`PORT` directly rather than reaching for
//! a configuration-file crate.

use std::env;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub database_url: String,
    pub database_token: Option<String>,
    pub database_pool_size: u32,
    pub database_command_timeout_secs: u64,
    pub port: u16,
    pub admin_token: String,

    pub populate_interval_ms: u64,
    pub populate_batch_size: u32,

    pub bot_retention_days: i64,
    pub cleanup_interval_hours: u64,
    pub cleanup_dry_run: bool,

    pub claimed_job_timeout: Duration,
    pub processing_job_timeout: Duration,

    pub jwt_signing_key_path: String,
    pub jwt_public_key_path: String,
    pub jwt_jwk_modulus_b64: String,
    pub jwt_jwk_exponent_b64: String,
    pub jwt_kid: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl CoordinatorConfig {
    pub fn from_env() -> Self {
        let config = Self {
            database_url: env::var("DATABASE_URL").expect("CRITICAL_FAULT: DATABASE_URL not defined in runtime environment."),
            database_token: env::var("TURSO_AUTH_TOKEN").ok(),
            database_pool_size: env_parsed("DATABASE_POOL_SIZE", 10),
            database_command_timeout_secs: env_parsed("DATABASE_COMMAND_TIMEOUT_SECONDS", 60),
            port: env_parsed("PORT", 3000),
            admin_token: env_or("ADMIN_TOKEN", "dev-admin-token"),

            populate_interval_ms: env_parsed("POPULATE_INTERVAL_MS", 30_000),
            populate_batch_size: env_parsed("BATCH_SIZE", 5),

            bot_retention_days: env_parsed("BOT_RETENTION_DAYS", 30),
            cleanup_interval_hours: env_parsed("CLEANUP_INTERVAL_HOURS", 6),
            cleanup_dry_run: env_parsed("CLEANUP_DRY_RUN", false),

            claimed_job_timeout: Duration::from_secs(env_parsed("CLAIMED_JOB_TIMEOUT_SECONDS", 300)),
            processing_job_timeout: Duration::from_secs(env_parsed("PROCESSING_JOB_TIMEOUT_SECONDS", 600)),

            jwt_signing_key_path: env::var("JWT_SIGNING_KEY_PATH").expect("CRITICAL_FAULT: JWT_SIGNING_KEY_PATH not defined in runtime environment."),
            jwt_public_key_path: env::var("JWT_PUBLIC_KEY_PATH").expect("CRITICAL_FAULT: JWT_PUBLIC_KEY_PATH not defined in runtime environment."),
            jwt_jwk_modulus_b64: env::var("JWT_JWK_N").expect("CRITICAL_FAULT: JWT_JWK_N (base64url RSA modulus) not defined in runtime environment."),
            jwt_jwk_exponent_b64: env_or("JWT_JWK_E", "AQAB"),
            jwt_kid: env_or("JWT_KID", "coordinator-2026"),
        };

        info!(
            database_pool_size = config.database_pool_size,
            database_command_timeout_secs = config.database_command_timeout_secs,
            port = config.port,
            populate_interval_ms = config.populate_interval_ms,
            populate_batch_size = config.populate_batch_size,
            bot_retention_days = config.bot_retention_days,
            cleanup_interval_hours = config.cleanup_interval_hours,
            cleanup_dry_run = config.cleanup_dry_run,
            claimed_job_timeout_secs = config.claimed_job_timeout.as_secs(),
            processing_job_timeout_secs = config.processing_job_timeout.as_secs(),
            jwt_kid = %config.jwt_kid,
            "⚙️  [CONFIG]: Coordinator configuration loaded."
        );

        config
    }
}
