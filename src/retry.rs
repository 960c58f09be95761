//! Retrying dispatcher: runs one logical request as a time-bounded series of attempts.
//!
//! Each failed attempt is classified into a [`FailureKind`] and handed to the
//! policy's predicate together with the attempt number and elapsed time. The
//! loop stops on success, when the predicate says stop, or once the total
//! timeout has been exceeded. There is no attempt-count limit.

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, warn};

/// First retry delay.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// No single retry delay is longer than this.
pub const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_secs(3 * 60);

/// Retrying stops once this much time has passed since the first attempt.
pub const DEFAULT_TOTAL_TIMEOUT: Duration = Duration::from_secs(10 * 60);

// 2^20 seconds already dwarfs any sane cap.
const MAX_BACKOFF_EXPONENT: u32 = 20;

/// Coarse classification of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// HTTP 429.
    RateLimited,
    /// Any other non-2xx status.
    NonSuccess,
    /// The request could not complete (DNS, TLS, connection reset, ...).
    Transport,
    /// 2xx response whose body was not the expected JSON.
    Decode,
}

/// Why one attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    #[error("got HTTP 429: too many requests, try again later")]
    RateLimited { body: Option<String> },

    #[error("got non-OK HTTP response {status}")]
    NonSuccess { status: u16, body: Option<String> },

    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),

    #[error("invalid JSON response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl AttemptError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::RateLimited { .. } => FailureKind::RateLimited,
            Self::NonSuccess { .. } => FailureKind::NonSuccess,
            Self::Transport(_) => FailureKind::Transport,
            Self::Decode(_) => FailureKind::Decode,
        }
    }

    /// Map an HTTP status and body to an attempt failure; `None` for 2xx.
    pub fn from_status(status: u16, body: &str) -> Option<Self> {
        let body = if body.trim().is_empty() {
            None
        } else {
            Some(body.to_owned())
        };
        match status {
            429 => Some(Self::RateLimited { body }),
            200..=299 => None,
            _ => Some(Self::NonSuccess { status, body }),
        }
    }
}

/// Terminal failure of the retry loop.
///
/// Displays as the message of the failure that ended the loop and exposes that
/// failure as its [`source`](StdError::source).
#[derive(Debug, thiserror::Error)]
#[error("{cause}")]
pub struct DispatchError {
    attempts: u32,
    #[source]
    cause: AttemptError,
}

impl DispatchError {
    pub fn cause(&self) -> &AttemptError {
        &self.cause
    }

    pub fn into_cause(self) -> AttemptError {
        self.cause
    }

    pub fn kind(&self) -> FailureKind {
        self.cause.kind()
    }

    /// Number of attempts made, including the one that failed last.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// What the retry predicate sees after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryContext {
    pub kind: FailureKind,
    /// 1-based number of the attempt that just failed.
    pub attempt: u32,
    /// Time since the first attempt started.
    pub elapsed: Duration,
}

type RetryPredicate = Arc<dyn Fn(&RetryContext) -> bool + Send + Sync>;

/// Backoff, jitter and stop rules for [`dispatch`].
#[derive(Clone)]
pub struct RetryPolicy {
    use_backoff: bool,
    use_jitter: bool,
    base_delay: Duration,
    max_retry_delay: Duration,
    total_timeout: Duration,
    on_error: RetryPredicate,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("use_backoff", &self.use_backoff)
            .field("use_jitter", &self.use_jitter)
            .field("base_delay", &self.base_delay)
            .field("max_retry_delay", &self.max_retry_delay)
            .field("total_timeout", &self.total_timeout)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    /// Exponential backoff with jitter, 3 minute cap, 10 minute budget.
    /// Rate-limited attempts are not retried; every other failure is.
    fn default() -> Self {
        Self {
            use_backoff: true,
            use_jitter: true,
            base_delay: DEFAULT_BASE_DELAY,
            max_retry_delay: DEFAULT_MAX_RETRY_DELAY,
            total_timeout: DEFAULT_TOTAL_TIMEOUT,
            on_error: Arc::new(|ctx: &RetryContext| ctx.kind != FailureKind::RateLimited),
        }
    }
}

impl RetryPolicy {
    /// Default timing, retrying every failure kind including rate limits.
    pub fn retry_all() -> Self {
        Self::default().on_error(|_| true)
    }

    /// A single attempt; the first failure is terminal.
    pub fn none() -> Self {
        Self::default().on_error(|_| false)
    }

    pub fn use_backoff(mut self, enabled: bool) -> Self {
        self.use_backoff = enabled;
        self
    }

    pub fn use_jitter(mut self, enabled: bool) -> Self {
        self.use_jitter = enabled;
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn max_retry_delay(mut self, delay: Duration) -> Self {
        self.max_retry_delay = delay;
        self
    }

    pub fn total_timeout(mut self, timeout: Duration) -> Self {
        self.total_timeout = timeout;
        self
    }

    /// Replace the continue/stop predicate. Returning `false` stops immediately.
    pub fn on_error<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RetryContext) -> bool + Send + Sync + 'static,
    {
        self.on_error = Arc::new(predicate);
        self
    }

    pub fn should_retry(&self, ctx: &RetryContext) -> bool {
        (self.on_error)(ctx)
    }

    /// Delay before the attempt following failed attempt number `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = self.backoff_for(attempt);
        if !self.use_jitter {
            return delay;
        }
        Duration::from_millis(rand::rng().random_range(0..=millis(delay)))
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        let delay = if self.use_backoff {
            let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
            self.base_delay.saturating_mul(1 << exponent)
        } else {
            self.base_delay
        };
        delay.min(self.max_retry_delay)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Run `operation` until it succeeds, the policy says stop, or the total
/// timeout is exceeded.
///
/// An attempt or delay already in flight when the budget runs out is allowed
/// to finish; the budget is checked after each failure.
pub async fn dispatch<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, DispatchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let started = Instant::now();
    let mut attempt: u32 = 1;

    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        let ctx = RetryContext {
            kind: error.kind(),
            attempt,
            elapsed: started.elapsed(),
        };
        warn!(
            attempt,
            kind = ?ctx.kind,
            elapsed_ms = millis(ctx.elapsed),
            error = %error,
            "attempt failed"
        );

        if !policy.should_retry(&ctx) {
            debug!(attempt, kind = ?ctx.kind, "retry policy declined to continue");
            return Err(DispatchError {
                attempts: attempt,
                cause: error,
            });
        }

        if ctx.elapsed > policy.total_timeout {
            debug!(
                attempt,
                timeout_ms = millis(policy.total_timeout),
                "retry budget exhausted"
            );
            return Err(DispatchError {
                attempts: attempt,
                cause: error,
            });
        }

        let delay = policy.delay_for(attempt);
        debug!(attempt, delay_ms = millis(delay), "retrying");
        tokio::time::sleep(delay).await;
        attempt = attempt.saturating_add(1);
    }
}
