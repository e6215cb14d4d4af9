//! Per-call fetch context.
//!
//! A [`FetchContext`] carries the caller's cancellation token and optional
//! deadline. Every outbound request runs through [`FetchContext::run`], so
//! cancelling the token or passing the deadline drops the in-flight request
//! future and unwinds as an [`HttpError`].

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::HttpError;

// ============================================================================
// Fetch Context
// ============================================================================

/// Cancellation and deadline for one retrieval call.
#[derive(Debug, Clone)]
pub struct FetchContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl FetchContext {
    /// Creates a context with no deadline and a fresh cancellation token.
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Creates a builder for customizing the context.
    pub fn builder() -> FetchContextBuilder {
        FetchContextBuilder::new()
    }

    /// Creates a child context.
    ///
    /// Cancelling the parent cancels the child; cancelling the child leaves
    /// the parent alone. The deadline is inherited.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancels this context (and its children).
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns true if the context was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true if the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Runs `fut` until it completes, the context is cancelled, or the
    /// deadline passes, whichever comes first.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Cancelled` or `HttpError::DeadlineExceeded` when
    /// the context ends first. `fut` is dropped in that case.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, HttpError>
    where
        F: Future,
    {
        if self.is_cancelled() {
            return Err(HttpError::Cancelled);
        }
        if self.is_expired() {
            return Err(HttpError::DeadlineExceeded);
        }

        let bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, fut)
                    .await
                    .map_err(|_| HttpError::DeadlineExceeded),
                None => Ok(fut.await),
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(HttpError::Cancelled),
            result = bounded => result,
        }
    }
}

impl Default for FetchContext {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Fetch Context Builder
// ============================================================================

/// Builder for constructing a `FetchContext`.
#[derive(Debug, Default)]
pub struct FetchContextBuilder {
    deadline: Option<Instant>,
}

impl FetchContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the deadline relative to now.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Builds the fetch context.
    pub fn build(self) -> FetchContext {
        FetchContext {
            cancel: CancellationToken::new(),
            deadline: self.deadline,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context_is_unbounded() {
        let ctx = FetchContext::new();
        assert!(ctx.deadline().is_none());
        assert!(!ctx.is_cancelled());
        assert!(!ctx.is_expired());
    }

    #[tokio::test]
    async fn test_child_inherits_cancellation() {
        let parent = FetchContext::new();
        let child = parent.child();
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn test_child_cancel_does_not_cancel_parent() {
        let parent = FetchContext::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn test_child_inherits_deadline() {
        let parent = FetchContext::builder()
            .timeout(Duration::from_secs(5))
            .build();
        let child = parent.child();
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = FetchContext::new();
        let value = ctx.run(async { 42 }).await.unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_run_cancelled_before_start() {
        let ctx = FetchContext::new();
        ctx.cancel();
        let result = ctx.run(async { 42 }).await;
        assert!(matches!(result, Err(HttpError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_deadline_exceeded() {
        let ctx = FetchContext::builder()
            .timeout(Duration::from_millis(100))
            .build();
        let result = ctx
            .run(tokio::time::sleep(Duration::from_secs(10)))
            .await;
        assert!(matches!(result, Err(HttpError::DeadlineExceeded)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_cancelled_in_flight() {
        let ctx = FetchContext::new();
        let handle = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.cancel();
        });
        let result = ctx
            .run(tokio::time::sleep(Duration::from_secs(10)))
            .await;
        assert!(matches!(result, Err(HttpError::Cancelled)));
    }
}
