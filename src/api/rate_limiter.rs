//! Adaptive client-side throttling driven by the server's quota headers.
//!
//! Every response carries `x-ratelimit-remaining` and `x-ratelimit-reset`.
//! [`RateLimiter::throttle`] spreads the remaining calls evenly across the
//! reset window, and [`RateLimiter::observe`] folds each response back in.

use std::time::Duration;

use reqwest::header::HeaderMap;
use tokio::sync::Mutex;
use tokio::time::{sleep, sleep_until, Instant};

pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// Longest per-call delay while quota is plentiful.
pub const MAX_WAIT: Duration = Duration::from_secs(2);

/// Above this many remaining calls the per-call delay is capped at [`MAX_WAIT`].
pub const ABUNDANT_QUOTA: f64 = 50.0;

/// Reset windows reported beyond this are clamped to it.
pub const MAX_RESET: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitState {
    pub remaining: f64,
    pub reset_at: Instant,
}

pub struct RateLimiter {
    state: Mutex<RateLimitState>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_state(RateLimitState {
            remaining: f64::from(i32::MAX),
            reset_at: Instant::now(),
        })
    }

    pub fn with_state(state: RateLimitState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub async fn state(&self) -> RateLimitState {
        *self.state.lock().await
    }

    /// Record the quota reported by a response.
    ///
    /// Both headers must be present and numeric, otherwise the state is left
    /// untouched.
    pub async fn observe(&self, headers: &HeaderMap) {
        let Some((remaining, reset_secs)) = parse_quota(headers) else {
            return;
        };

        let reset_in = Duration::try_from_secs_f64(reset_secs)
            .map_or(MAX_RESET, |reset_in| reset_in.min(MAX_RESET));

        let mut state = self.state.lock().await;
        state.remaining = remaining;
        state.reset_at = Instant::now() + reset_in;
        tracing::trace!(remaining, reset_secs, "Rate limit state updated");
    }

    /// Wait as long as the current quota requires before the next request.
    ///
    /// The lock is held for the whole decision and wait, so concurrent callers
    /// queue up behind each other.
    pub async fn throttle(&self) {
        let mut state = self.state.lock().await;

        if state.remaining <= 1.0 {
            if state.reset_at > Instant::now() {
                tracing::debug!(
                    wait_ms = state.reset_at.saturating_duration_since(Instant::now()).as_millis() as u64,
                    "Rate limit exhausted, waiting for reset"
                );
                sleep_until(state.reset_at).await;
            }
            return;
        }

        let until_reset = state
            .reset_at
            .saturating_duration_since(Instant::now())
            .as_secs_f64();
        let mut delay = Duration::from_secs_f64(until_reset / state.remaining);

        if state.remaining > ABUNDANT_QUOTA {
            delay = delay.min(MAX_WAIT);
        }

        if !delay.is_zero() {
            tracing::debug!(
                delay_ms = delay.as_millis() as u64,
                remaining = state.remaining,
                "Throttling request"
            );
            sleep(delay).await;
        }

        // The real value only arrives with the response.
        state.remaining -= 1.0;
    }
}

fn parse_quota(headers: &HeaderMap) -> Option<(f64, f64)> {
    let header = |name: &str| -> Option<f64> {
        headers
            .get(name)?
            .to_str()
            .ok()?
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    };

    let remaining = header(REMAINING_HEADER)?;
    let reset = header(RESET_HEADER)?;
    Some((remaining, reset.max(0.0)))
}
