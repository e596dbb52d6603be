//! Per-request context: cancellation and the host deadline.
//!
//! Every host callback owns one [`RequestContext`]. Remote calls and retry
//! sleeps run under it, and a cancelled or expired context turns into
//! [`Error::Cancelled`], which the lifecycle boundary swallows.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiResult, Error};

/// Cancellation and deadline carried by a host request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context with no deadline that is never cancelled unless asked to.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a cancellation token owned by the caller.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Expire the context at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Expire the context after `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// The host deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel the context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the context is cancelled or past its deadline.
    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolve once the context is cancelled or past its deadline.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            },
            None => self.cancel.cancelled().await,
        }
    }

    /// Run a remote call under this context.
    ///
    /// The context is checked before the call starts and raced against it;
    /// a failure that coincides with cancellation is reported as
    /// [`Error::Cancelled`].
    pub async fn run<T, F>(&self, call: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        if self.is_done() {
            return Err(Error::Cancelled);
        }
        let result = tokio::select! {
            biased;
            _ = self.done() => return Err(Error::Cancelled),
            result = call => result,
        };
        match result {
            Err(_) if self.is_done() => Err(Error::Cancelled),
            other => other,
        }
    }

    /// Run a single remote API call under this context.
    pub async fn call<T, F>(&self, call: F) -> Result<T, Error>
    where
        F: Future<Output = ApiResult<T>>,
    {
        self.run(async { call.await.map_err(Error::from) }).await
    }

    /// Sleep for `duration`, returning early with [`Error::Cancelled`].
    pub async fn sleep(&self, duration: Duration) -> Result<(), Error> {
        tokio::select! {
            biased;
            _ = self.done() => Err(Error::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}
