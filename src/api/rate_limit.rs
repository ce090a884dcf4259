//! Request budget for the consultation endpoints
//!
//! Each consultation fans out to three upstream calls, so `/api/*` can be
//! capped at a fixed number of requests per minute. Synthesized audio, the
//! form and health checks are never counted.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};

use super::consult::ConsultError;

/// Requests-per-minute budget shared by every `/api` route
pub struct RequestBudget {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    refill: Duration,
}

impl RequestBudget {
    /// Allow `requests_per_minute` requests, all of which may arrive at once
    ///
    /// A zero budget is treated as one.
    #[must_use]
    pub fn per_minute(requests_per_minute: u32) -> Self {
        let burst = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_minute(burst);
        Self {
            refill: quota.replenish_interval(),
            limiter: RateLimiter::direct(quota),
        }
    }

    /// Spend one request
    ///
    /// # Errors
    ///
    /// Returns the time until one more request is refilled when the budget
    /// is spent
    pub fn spend(&self) -> Result<(), Duration> {
        self.limiter.check().map_err(|_| self.refill)
    }
}

/// Middleware rejecting requests once the budget is spent
///
/// # Errors
///
/// Returns [`ConsultError::RateLimited`] (`429` with `Retry-After`)
pub async fn enforce(
    State(budget): State<Arc<RequestBudget>>,
    req: Request,
    next: Next,
) -> Result<Response, ConsultError> {
    if let Err(retry_after) = budget.spend() {
        tracing::warn!(
            path = %req.uri().path(),
            retry_after_secs = retry_after.as_secs(),
            "request budget spent"
        );
        return Err(ConsultError::RateLimited { retry_after });
    }
    Ok(next.run(req).await)
}
