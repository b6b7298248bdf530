//! Per-call deadline and cancellation.

use crate::error::Error;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
pub use tokio_util::sync::CancellationToken;

/// Deadline and cancellation signal for one logical call.
///
/// Both the in-flight HTTP exchange and any backoff sleep are raced against it.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

impl CallContext {
    /// No deadline, no cancellation.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::default().deadline(Instant::now() + timeout)
    }

    pub fn deadline(mut self, at: Instant) -> Self {
        self.deadline = Some(at);
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline_at(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail fast if the call is already over before starting more work.
    pub fn check(&self) -> Result<(), Error> {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(Error::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Error::DeadlineExceeded);
        }
        Ok(())
    }

    /// Run `fut` unless the deadline passes or the token fires first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, Error>
    where
        F: Future<Output = T>,
    {
        self.check()?;
        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            biased;
            _ = cancelled => Err(Error::Cancelled),
            _ = expired => Err(Error::DeadlineExceeded),
            out = fut => Ok(out),
        }
    }

    /// Backoff sleep that ends early with the context's error.
    pub async fn sleep(&self, delay: Duration) -> Result<(), Error> {
        self.run(tokio::time::sleep(delay)).await
    }
}
