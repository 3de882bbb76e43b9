//! Exponential backoff for transient storage failures.
//!
//! Only connection-level failures and SQLite lock contention are retried.
//! Constraint violations, missing rows and other logical errors go straight
//! back to the caller.

use std::future::Future;
use std::time::Duration;

use sea_orm::DbErr;
use tracing::{info, warn};

use crate::config;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy built from `STORAGE_RETRY_ATTEMPTS` and `STORAGE_RETRY_BASE_MS`.
    pub fn from_config() -> Self {
        Self {
            max_retries: config::storage_retry_attempts(),
            initial_delay: Duration::from_millis(config::storage_retry_base_ms()),
            ..Self::default()
        }
    }

    /// `initial_delay * multiplier^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_ms = self.initial_delay.as_millis() as f64;
        let delay_ms = base_ms * self.multiplier.powi(attempt as i32);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

/// Whether `err` is worth another attempt.
pub fn is_transient(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => true,
        DbErr::Exec(_) | DbErr::Query(_) => {
            let msg = err.to_string();
            msg.contains("database is locked") || msg.contains("SQLITE_BUSY")
        }
        _ => false,
    }
}

/// Runs `operation` until it succeeds, fails with a non-transient error, or
/// the policy is exhausted. The last error is returned unchanged.
pub async fn retry_transient<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(operation = operation_name, attempt, "Storage operation recovered");
                }
                return Ok(value);
            }
            Err(err) => {
                if !is_transient(&err) {
                    return Err(err);
                }
                if !policy.should_retry(attempt) {
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_retries = policy.max_retries,
                        error = %err,
                        "Giving up on storage operation"
                    );
                    return Err(err);
                }

                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    operation = operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient storage error, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
