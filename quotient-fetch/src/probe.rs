//! Ordered endpoint probing.
//!
//! When an upstream API's exact path is not guaranteed stable, callers keep
//! an ordered list of candidate endpoints (most specific first) and try
//! them one at a time until one succeeds. Candidates are never probed in
//! parallel: the first success must short-circuit the rest, and speculative
//! requests would spend the account's upstream rate-limit budget.

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;

// ============================================================================
// Probe Attempt
// ============================================================================

/// Record of a single endpoint attempt.
#[derive(Debug, Clone)]
pub struct ProbeAttempt {
    /// The endpoint that was attempted.
    pub endpoint: String,
    /// Whether the attempt succeeded.
    pub success: bool,
    /// Error if the attempt failed.
    pub error: Option<String>,
}

impl ProbeAttempt {
    fn success(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            success: true,
            error: None,
        }
    }

    fn failure(endpoint: &str, error: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            success: false,
            error: Some(error.into()),
        }
    }
}

// ============================================================================
// Probe Outcome
// ============================================================================

/// The endpoint that answered and what it produced.
#[derive(Debug, Clone)]
pub struct ProbeSuccess<T> {
    /// Endpoint that succeeded.
    pub endpoint: String,
    /// Value produced by the attempt.
    pub value: T,
}

/// Why probing produced no value.
#[derive(Debug)]
pub enum ProbeFailure<E> {
    /// The endpoint list was empty.
    NoEndpoints,
    /// Every attempted endpoint failed; holds the last error observed.
    Exhausted(E),
}

/// The outcome of probing an endpoint list.
#[derive(Debug)]
pub struct ProbeOutcome<T, E> {
    /// The first success, or the reason there was none.
    pub result: Result<ProbeSuccess<T>, ProbeFailure<E>>,
    /// All attempts made, in order.
    pub attempts: Vec<ProbeAttempt>,
    /// Total duration of all attempts.
    pub duration: Duration,
}

impl<T, E> ProbeOutcome<T, E> {
    /// Returns true if some endpoint succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns the number of endpoints that were tried.
    pub fn attempts_count(&self) -> usize {
        self.attempts.len()
    }

    /// Returns the successful endpoint, if any.
    pub fn successful_endpoint(&self) -> Option<&str> {
        self.result.as_ref().ok().map(|s| s.endpoint.as_str())
    }

    /// Drops the attempt log and keeps the result.
    ///
    /// # Errors
    ///
    /// Returns the `ProbeFailure` when no endpoint succeeded.
    pub fn into_result(self) -> Result<ProbeSuccess<T>, ProbeFailure<E>> {
        self.result
    }
}

// ============================================================================
// Probing
// ============================================================================

/// Tries `endpoints` in order until `attempt` succeeds for one of them.
///
/// Every failure falls through to the next endpoint; the last error is
/// kept for the outcome.
pub async fn probe_in_order<S, T, E, F, Fut>(endpoints: &[S], attempt: F) -> ProbeOutcome<T, E>
where
    S: AsRef<str>,
    E: Display,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    probe_in_order_with(endpoints, attempt, |_| true).await
}

/// Like [`probe_in_order`], but stops early when `should_continue`
/// returns false for an error. The stopping error becomes the outcome.
pub async fn probe_in_order_with<S, T, E, F, Fut, C>(
    endpoints: &[S],
    mut attempt: F,
    should_continue: C,
) -> ProbeOutcome<T, E>
where
    S: AsRef<str>,
    E: Display,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
{
    let start = Instant::now();
    let mut attempts = Vec::with_capacity(endpoints.len());
    let mut last_error = None;

    for endpoint in endpoints {
        let endpoint = endpoint.as_ref();
        let attempt_start = Instant::now();
        debug!(endpoint = %endpoint, "Probing endpoint");

        let result = attempt(endpoint.to_string()).await;
        let elapsed = attempt_start.elapsed();

        match result {
            Ok(value) => {
                attempts.push(ProbeAttempt::success(endpoint));
                debug!(endpoint = %endpoint, attempts = attempts.len(), ?elapsed, "Endpoint probe succeeded");
                return ProbeOutcome {
                    result: Ok(ProbeSuccess {
                        endpoint: endpoint.to_string(),
                        value,
                    }),
                    attempts,
                    duration: start.elapsed(),
                };
            }
            Err(e) => {
                debug!(endpoint = %endpoint, error = %e, ?elapsed, "Endpoint probe failed");
                attempts.push(ProbeAttempt::failure(endpoint, e.to_string()));
                let stop = !should_continue(&e);
                last_error = Some(e);
                if stop {
                    debug!(endpoint = %endpoint, "Stopping probe early");
                    break;
                }
            }
        }
    }

    let result = match last_error {
        Some(e) => {
            debug!(attempts = attempts.len(), error = %e, "All probed endpoints failed");
            Err(ProbeFailure::Exhausted(e))
        }
        None => Err(ProbeFailure::NoEndpoints),
    };

    ProbeOutcome {
        result,
        attempts,
        duration: start.elapsed(),
    }
}

// ============================================================================
// Tests
// ============================================================================
