//! Retry policy around a single install routine.

use std::future::Future;
use std::time::Duration;

use crate::types::{InstallationResult, InstallationStatus};

/// Delay between the first and second attempt
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Total attempts when retry is enabled
pub const MAX_ATTEMPTS: u32 = 2;

/// What to do with the outcome of one attempt.
#[derive(Debug)]
pub enum RetryDecision<T> {
    Retry,
    Accept(T),
}

/// Decides per attempt whether an install outcome is final.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub retry_on_failure: bool,
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_on_failure: false,
            max_attempts: MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(retry_on_failure: bool) -> Self {
        Self {
            retry_on_failure,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Decide on the outcome of attempt number `attempt` (1-based).
    ///
    /// Without retry an error becomes a `Failed` result. With retry, a failure
    /// or error before the last attempt is retried; on the last attempt a
    /// result is accepted as-is and an error is handed back unchanged.
    pub fn decide(
        &self,
        attempt: u32,
        outcome: anyhow::Result<InstallationResult>,
    ) -> RetryDecision<anyhow::Result<InstallationResult>> {
        if !self.retry_on_failure {
            return RetryDecision::Accept(
                outcome.or_else(|err| Ok(InstallationResult::failed(format!("{err:#}")))),
            );
        }

        let last_attempt = attempt >= self.max_attempts;
        match outcome {
            Ok(result) if result.status == InstallationStatus::Failed && !last_attempt => {
                tracing::warn!(
                    "Attempt {} failed: {}",
                    attempt,
                    result.message.as_deref().unwrap_or("no message")
                );
                RetryDecision::Retry
            }
            Err(err) if !last_attempt => {
                tracing::warn!("Attempt {} errored: {:#}", attempt, err);
                RetryDecision::Retry
            }
            other => RetryDecision::Accept(other),
        }
    }
}

/// Drives a routine through the retry policy.
#[derive(Debug, Clone, Default)]
pub struct RetryingExecutor {
    policy: RetryPolicy,
}

impl RetryingExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Run `routine` until the policy accepts an outcome.
    ///
    /// The routine receives the 1-based attempt number.
    pub async fn execute<F, Fut>(&self, mut routine: F) -> anyhow::Result<InstallationResult>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = anyhow::Result<InstallationResult>>,
    {
        let mut attempt = 1;
        loop {
            let outcome = routine(attempt).await;
            match self.policy.decide(attempt, outcome) {
                RetryDecision::Accept(outcome) => return outcome,
                RetryDecision::Retry => {
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
