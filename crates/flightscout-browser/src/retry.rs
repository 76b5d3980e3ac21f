use crate::Error;
use flightscout_core::fares::FailureRecord;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

/// Lets the retry policy tell a timed-out step from any other failure
pub trait RetryClass {
    fn is_workflow_timeout(&self) -> bool;
}

impl RetryClass for Error {
    fn is_workflow_timeout(&self) -> bool {
        matches!(self, Error::WorkflowTimeout { .. })
    }
}

/// A workflow that exhausted its attempts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{label} failed after {attempts} attempt(s): {last_error}")]
pub struct WorkflowFailure {
    pub label: String,
    pub attempts: u32,
    pub last_error: String,
    pub history: Vec<String>,
}

impl WorkflowFailure {
    pub fn into_record(self) -> FailureRecord {
        FailureRecord {
            attempts: self.attempts,
            error: self.last_error,
            history: self.history,
        }
    }
}

/// Re-runs a whole workflow from its first step when it fails.
///
/// Intermediate page state cannot be recovered reliably, so a failed
/// attempt is never resumed; the workflow starts over (re-navigating).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Pause before re-running after a timeout
    pub timeout_backoff: Duration,
    /// Pause before re-running after any other error
    pub error_backoff: Duration,
    /// Upper bound on a single attempt's run time
    pub attempt_budget: Option<Duration>,
    /// Surface non-timeout errors immediately so the page can be inspected
    pub debug: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_backoff: Duration::from_secs(1),
            error_backoff: Duration::from_secs(1),
            attempt_budget: Some(Duration::from_secs(300)),
            debug: false,
        }
    }
}

struct AttemptError {
    timeout: bool,
    message: String,
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_attempt_budget(mut self, budget: Option<Duration>) -> Self {
        self.attempt_budget = budget;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Run `workflow` until it succeeds or attempts run out.
    ///
    /// `workflow` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut workflow: F) -> Result<T, WorkflowFailure>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryClass + Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut history = Vec::new();

        for attempt in 1..=max_attempts {
            tracing::debug!("{}: attempt {}/{}", label, attempt, max_attempts);

            let outcome = match self.attempt_budget {
                Some(budget) => match tokio::time::timeout(budget, workflow(attempt)).await {
                    Ok(result) => result.map_err(classify),
                    Err(_) => Err(AttemptError {
                        timeout: true,
                        message: format!("attempt exceeded its {:?} budget", budget),
                    }),
                },
                None => workflow(attempt).await.map_err(classify),
            };

            let err = match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!("{}: succeeded on attempt {}", label, attempt);
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            history.push(err.message.clone());

            if self.debug && !err.timeout {
                tracing::error!("{}: {} (debug mode, not retrying)", label, err.message);
                break;
            }
            if attempt == max_attempts {
                break;
            }

            let backoff = if err.timeout {
                self.timeout_backoff
            } else {
                self.error_backoff
            };
            tracing::warn!(
                "{}: attempt {} {}: {}; retrying in {:?}",
                label,
                attempt,
                if err.timeout { "timed out" } else { "failed" },
                err.message,
                backoff
            );
            sleep(backoff).await;
        }

        let failure = WorkflowFailure {
            label: label.to_string(),
            attempts: history.len() as u32,
            last_error: history.last().cloned().unwrap_or_default(),
            history,
        };
        tracing::error!("{}", failure);
        Err(failure)
    }
}

fn classify<E: RetryClass + Display>(err: E) -> AttemptError {
    AttemptError {
        timeout: err.is_workflow_timeout(),
        message: err.to_string(),
    }
}
