//! Bounded retry with exponential backoff for eventually-consistent calls.
//!
//! The loop is purely sequential: call, classify, sleep, call again. Each
//! failure is offered to a list of predicates; if any accepts it the loop
//! sleeps for the current backoff (doubling up to the maximum) and retries.
//! The loop gives up with the last error once its own timeout or the request
//! deadline passes, whichever comes first.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::api::{Error, ErrorKind};
use crate::context::RequestContext;

/// Predicate deciding whether a failure should be retried.
pub type Retryable = fn(&Error) -> bool;

/// Retry concurrent-modification and not-yet-permitted failures.
pub fn is_conflict(err: &Error) -> bool {
    err.kind() == ErrorKind::Conflict
}

/// Retry dependency-propagation sentinels.
pub fn is_transient(err: &Error) -> bool {
    err.kind() == ErrorKind::Transient
}

/// Retry not-found, for calls that reference a just-created dependency.
pub fn is_not_found(err: &Error) -> bool {
    err.kind() == ErrorKind::NotFound
}

/// Timing parameters of a retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total time budget for the loop.
    pub timeout: Duration,
    /// First sleep between attempts.
    pub initial_backoff: Duration,
    /// Cap for the doubling backoff.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2 * 60),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Policy with the given timeout and default backoff.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Default::default()
        }
    }

    /// Override the backoff bounds.
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max.max(initial);
        self
    }
}

/// Run `call` until it succeeds, fails with a non-retryable error, or the
/// time budget runs out.
///
/// `operation` names the call in logs.
pub async fn retry<T, F, Fut>(
    ctx: &RequestContext,
    policy: &RetryPolicy,
    retryable: &[Retryable],
    operation: &str,
    mut call: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut deadline = Instant::now() + policy.timeout;
    if let Some(host_deadline) = ctx.deadline() {
        deadline = deadline.min(host_deadline);
    }
    let mut backoff = policy.initial_backoff;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let err = match ctx.run(call()).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation, attempt, "Retried operation succeeded");
                }
                return Ok(value);
            },
            Err(err) => err,
        };

        if err.is_cancelled() {
            return Err(err);
        }
        if !retryable.iter().any(|accept| accept(&err)) {
            return Err(err);
        }

        let now = Instant::now();
        if now >= deadline {
            warn!(operation, attempt, error = %err, "Retry budget exhausted");
            return Err(err);
        }

        let pause = backoff.min(deadline - now);
        debug!(
            operation,
            attempt,
            backoff_ms = pause.as_millis() as u64,
            error = %err,
            "Retryable failure, backing off"
        );
        ctx.sleep(pause).await?;
        backoff = (backoff * 2).min(policy.max_backoff);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::api::{codes, ApiError};
    use tokio_util::sync::CancellationToken;

    fn conflict() -> Error {
        Error::from(ApiError::new(codes::CONCURRENT_MODIFICATION, "busy"))
    }

    fn policy(timeout_secs: u64) -> RetryPolicy {
        RetryPolicy::with_timeout(Duration::from_secs(timeout_secs))
            .with_backoff(Duration::from_secs(1), Duration::from_secs(8))
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_retryable_failures() {
        let calls = AtomicU32::new(0);
        let ctx = RequestContext::new();

        let result = retry(&ctx, &policy(60), &[is_conflict], "associate", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(conflict())
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_returns_immediately() {
        let calls = AtomicU32::new(0);
        let ctx = RequestContext::new();

        let result: Result<(), _> = retry(&ctx, &policy(60), &[is_transient], "create", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(conflict()) }
        })
        .await;

        assert_eq!(result, Err(conflict()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_doubles_and_caps() {
        let ctx = RequestContext::new();
        let start = Instant::now();
        let calls = AtomicU32::new(0);

        let result = retry(&ctx, &policy(600), &[is_conflict], "update", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 6 {
                    Err(conflict())
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(result.is_ok());
        // 1 + 2 + 4 + 8 + 8 + 8
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(31) && elapsed < Duration::from_secs(32));
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_last_error_within_budget() {
        let ctx = RequestContext::new();
        let start = Instant::now();
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = retry(&ctx, &policy(20), &[is_conflict], "update", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Err(Error::from(ApiError::new(
                    codes::CONCURRENT_MODIFICATION,
                    format!("attempt {n}"),
                )))
            }
        })
        .await;

        let err = result.unwrap_err();
        let last = calls.load(Ordering::SeqCst) - 1;
        assert_eq!(err.to_string(), format!("ConcurrentModificationException: attempt {last}"));
        assert!(start.elapsed() <= Duration::from_secs(20) + Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_host_deadline_wins_over_policy_timeout() {
        let ctx = RequestContext::new().with_timeout(Duration::from_secs(5));
        let start = Instant::now();

        let result: Result<(), _> = retry(&ctx, &policy(600), &[is_conflict], "update", || async {
            Err(conflict())
        })
        .await;

        assert!(result.is_err());
        assert!(start.elapsed() <= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_the_loop() {
        let token = CancellationToken::new();
        let ctx = RequestContext::new().with_cancellation(token.clone());

        let handle = tokio::spawn(async move {
            retry(&ctx, &policy(600), &[is_conflict], "update", || async {
                Err::<(), _>(conflict())
            })
            .await
        });
        tokio::time::sleep(Duration::from_millis(1500)).await;
        token.cancel();

        assert_eq!(handle.await.unwrap(), Err(Error::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_any_predicate_accepts() {
        let ctx = RequestContext::new();
        let calls = AtomicU32::new(0);

        let result = retry(
            &ctx,
            &policy(60),
            &[is_conflict, is_transient],
            "batch",
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    match n {
                        0 => Err(Error::not_ready("STACK_NOT_FOUND", "not yet")),
                        1 => Err(conflict()),
                        _ => Ok(n),
                    }
                }
            },
        )
        .await;

        assert_eq!(result, Ok(2));
    }
}
