//! Single-flight concurrency guard
//!
//! Before a plan is launched the guard checks that no execution of the same
//! plan identity is running, backing off while one is. The check and the
//! subsequent launch are not atomic: two invocations racing through the
//! guard can both observe an idle plan.

use crate::error::LaunchError;
use crate::orchestrator::{list_all_running, Orchestrator};
use crate::types::{duration_ms, RetryPolicy};
use std::sync::Arc;
use std::time::Duration;

/// Gate that fails while the plan has a running execution
#[derive(Clone)]
pub struct ConcurrencyGuard {
    orchestrator: Arc<dyn Orchestrator>,
    policy: RetryPolicy,
}

impl std::fmt::Debug for ConcurrencyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrencyGuard")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl ConcurrencyGuard {
    /// Create guard over an orchestrator
    #[inline]
    #[must_use]
    pub fn new(orchestrator: Arc<dyn Orchestrator>, policy: RetryPolicy) -> Self {
        Self {
            orchestrator,
            policy,
        }
    }

    /// Retry policy in use
    #[inline]
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Check once for a running execution
    ///
    /// # Errors
    /// - `LaunchError::Conflict` naming the first running execution
    /// - `LaunchError::Transport` if the listing fails
    pub async fn check(&self, plan_identity: &str) -> Result<(), LaunchError> {
        let running = list_all_running(self.orchestrator.as_ref(), plan_identity).await?;
        match running.into_iter().next() {
            Some(execution) => Err(LaunchError::Conflict {
                plan_identity: plan_identity.to_string(),
                execution_name: execution.execution_name,
            }),
            None => Ok(()),
        }
    }

    /// Check with backoff until the plan is idle or the wait cap is spent
    ///
    /// Returns the number of checks made. Only conflicts are retried.
    ///
    /// # Errors
    /// - the last `LaunchError::Conflict` once the cap is exhausted
    /// - any other error of [`ConcurrencyGuard::check`] immediately
    pub async fn acquire(&self, plan_identity: &str) -> Result<u32, LaunchError> {
        let mut attempt = 1u32;
        let mut waited = Duration::ZERO;

        loop {
            match self.check(plan_identity).await {
                Ok(()) => {
                    tracing::debug!(plan_identity, attempt, "No running execution");
                    return Ok(attempt);
                }
                Err(err) if err.is_retryable() => {
                    let Some(delay) = self.policy.next_delay(attempt, waited) else {
                        tracing::warn!(
                            plan_identity,
                            attempt,
                            waited_ms = duration_ms(waited),
                            error = %err,
                            "Giving up waiting for running execution"
                        );
                        return Err(err);
                    };

                    tracing::warn!(
                        plan_identity,
                        attempt,
                        delay_ms = duration_ms(delay),
                        error = %err,
                        "Running execution detected, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    waited += delay;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
