use async_trait::async_trait;
use shared_error::AppError;

use super::model::AuthAttempt;

/// Rate limiter consulted by every credential-accepting operation
///
/// `check` runs before any work; `record` appends the attempt afterwards.
/// Only failed attempts count against a rule, but successes are recorded too.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Fails with `RateLimited { retry_after_seconds }` when any enabled rule
    /// for the project is tripped. An internal limiter failure propagates to
    /// the caller as its error.
    async fn check(
        &self,
        project_id: &str,
        ip_address: Option<&str>,
        email: Option<&str>,
    ) -> Result<(), AppError>;

    async fn record(&self, attempt: &AuthAttempt) -> Result<(), AppError>;
}
