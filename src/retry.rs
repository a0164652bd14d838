//! Retrying Request Executor
//!
//! Wraps a single gateway operation with a bounded retry budget. Rate-limited
//! attempts back off exponentially from the configured base; any other failure
//! waits a fixed delay. Both kinds draw from the same budget, and the executor
//! always resolves to exactly one terminal [`GenerationOutcome`].

use crate::error::FailureKind;
use crate::gateway::{dispatch, GenerationGateway, GenerationOutcome, GenerationRequest};
use crate::pacing::{PacingConfig, Sleeper};
use crate::sink::{PresentationEvent, PresentationSink};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Backoff law shared by every retried request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub rate_limit_base: Duration,
    pub error_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_pacing(&PacingConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_pacing(pacing: &PacingConfig) -> Self {
        Self {
            rate_limit_base: Duration::from_millis(pacing.rate_limit_base_ms),
            error_delay: Duration::from_millis(pacing.error_retry_delay_ms),
        }
    }

    /// Wait after rate-limited attempt `attempt` (1-based): base * 2^(attempt-1).
    pub fn rate_limit_backoff(&self, attempt: u32) -> Duration {
        let base_ms = self.rate_limit_base.as_millis() as u64;
        let factor = 1u64
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(factor))
    }

    pub fn wait_after(&self, kind: FailureKind, attempt: u32) -> Duration {
        match kind {
            FailureKind::RateLimited => self.rate_limit_backoff(attempt),
            FailureKind::Transient | FailureKind::Fatal => self.error_delay,
        }
    }
}

/// Per-request retry bookkeeping; lives for one `execute` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    pub attempts_remaining: u32,
    pub backoff_millis: u64,
    attempt: u32,
}

impl RetryState {
    fn new(max_retries: u32) -> Self {
        Self {
            attempts_remaining: max_retries,
            backoff_millis: 0,
            attempt: 0,
        }
    }

    fn begin_attempt(&mut self) -> u32 {
        self.attempt += 1;
        self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
        self.attempt
    }

    fn exhausted(&self) -> bool {
        self.attempts_remaining == 0
    }
}

pub struct RetryingExecutor<'a> {
    gateway: &'a dyn GenerationGateway,
    sink: &'a dyn PresentationSink,
    sleeper: &'a dyn Sleeper,
    policy: RetryPolicy,
}

impl<'a> RetryingExecutor<'a> {
    pub fn new(
        gateway: &'a dyn GenerationGateway,
        sink: &'a dyn PresentationSink,
        sleeper: &'a dyn Sleeper,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            gateway,
            sink,
            sleeper,
            policy,
        }
    }

    /// Run `request` with at most `max_retries` attempts (values below 1 count as 1).
    pub async fn execute(&self, request: &GenerationRequest, max_retries: u32) -> GenerationOutcome {
        let mut state = RetryState::new(max_retries.max(1));
        let kind = request.kind();

        loop {
            let attempt = state.begin_attempt();
            self.sink.emit(PresentationEvent::RequestAttempt {
                request: request.clone(),
                attempt,
                remaining: state.attempts_remaining,
            });
            debug!(
                gateway = self.gateway.gateway_name(),
                request = kind.as_str(),
                attempt,
                remaining = state.attempts_remaining,
                "issuing gateway request"
            );

            let (failure, message) = match dispatch(self.gateway, request).await {
                GenerationOutcome::Success(payload) => {
                    if attempt > 1 {
                        info!(request = kind.as_str(), attempt, "request succeeded after retry");
                    }
                    return GenerationOutcome::Success(payload);
                }
                GenerationOutcome::Failure { kind, message } => (kind, message),
            };

            if state.exhausted() {
                warn!(
                    request = kind.as_str(),
                    attempts = attempt,
                    failure = failure.as_str(),
                    error = %message,
                    "request failed after all retry attempts"
                );
                return GenerationOutcome::Failure {
                    kind: failure,
                    message,
                };
            }

            let wait = self.policy.wait_after(failure, attempt);
            state.backoff_millis = wait.as_millis() as u64;
            self.sink.emit(PresentationEvent::RequestBackoff {
                request: request.clone(),
                attempt,
                remaining: state.attempts_remaining,
                wait_ms: state.backoff_millis,
                reason: failure,
            });
            warn!(
                request = kind.as_str(),
                attempt,
                remaining = state.attempts_remaining,
                wait_ms = state.backoff_millis,
                failure = failure.as_str(),
                error = %message,
                "request failed, retrying"
            );
            self.sleeper.sleep(wait).await;
        }
    }
}
