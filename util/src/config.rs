//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_duration_minutes: u64,
    /// How long a freshly issued attendance token stays redeemable.
    pub session_validity_minutes: u64,
    /// How many days ahead of today a session may be issued for.
    pub session_horizon_days: u64,
    /// Percentage below which a student counts as low attendance.
    pub low_attendance_threshold: f64,
    pub storage_retry_attempts: u32,
    pub storage_retry_base_ms: u64,
    pub ws_ping_seconds: u64,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring malformed configuration value");
            default
        }),
        Err(_) => default,
    }
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Missing values fall back to development defaults. Malformed numeric
    /// values are logged and replaced by their default.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME")
                .unwrap_or_else(|_| "attendance-service".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "api=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "data/attendance.db".into()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: parse_or("PORT", 3000),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| "development-secret".into()),
            jwt_duration_minutes: parse_or("JWT_DURATION_MINUTES", 60),
            session_validity_minutes: parse_or("SESSION_VALIDITY_MINUTES", 5),
            session_horizon_days: parse_or("SESSION_HORIZON_DAYS", 7),
            low_attendance_threshold: parse_or("LOW_ATTENDANCE_THRESHOLD", 75.0),
            storage_retry_attempts: parse_or("STORAGE_RETRY_ATTEMPTS", 3),
            storage_retry_base_ms: parse_or("STORAGE_RETRY_BASE_MS", 50),
            ws_ping_seconds: parse_or("WS_PING_SECONDS", 30),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    ///
    /// Used by public per-field setter methods.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_jwt_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.jwt_secret = value.into());
    }

    pub fn set_jwt_duration_minutes(value: impl Into<u64>) {
        AppConfig::set_field(|cfg| cfg.jwt_duration_minutes = value.into());
    }

    pub fn set_session_validity_minutes(value: impl Into<u64>) {
        AppConfig::set_field(|cfg| cfg.session_validity_minutes = value.into());
    }

    pub fn set_session_horizon_days(value: impl Into<u64>) {
        AppConfig::set_field(|cfg| cfg.session_horizon_days = value.into());
    }

    pub fn set_low_attendance_threshold(value: f64) {
        AppConfig::set_field(|cfg| cfg.low_attendance_threshold = value);
    }

    pub fn set_storage_retry_attempts(value: impl Into<u32>) {
        AppConfig::set_field(|cfg| cfg.storage_retry_attempts = value.into());
    }
}

// --- Free-standing getters used across crates ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn database_path() -> String {
    AppConfig::global().database_path.clone()
}

pub fn host() -> String {
    AppConfig::global().host.clone()
}

pub fn port() -> u16 {
    AppConfig::global().port
}

pub fn jwt_secret() -> String {
    AppConfig::global().jwt_secret.clone()
}

pub fn jwt_duration_minutes() -> u64 {
    AppConfig::global().jwt_duration_minutes
}

pub fn session_validity_minutes() -> u64 {
    AppConfig::global().session_validity_minutes
}

pub fn session_horizon_days() -> u64 {
    AppConfig::global().session_horizon_days
}

pub fn low_attendance_threshold() -> f64 {
    AppConfig::global().low_attendance_threshold
}

pub fn storage_retry_attempts() -> u32 {
    AppConfig::global().storage_retry_attempts
}

pub fn storage_retry_base_ms() -> u64 {
    AppConfig::global().storage_retry_base_ms
}

pub fn ws_ping_seconds() -> u64 {
    AppConfig::global().ws_ping_seconds
}
