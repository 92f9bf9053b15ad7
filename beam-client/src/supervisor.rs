use crate::error::SessionError;
use crate::machine::{Effect, NegotiationState, Timer, TimerKind};
use crate::notifier::Notice;
use std::time::Duration;
use tracing::{info, warn};

/// Bounded linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            step: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before the 1-based `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay + self.step * attempt.saturating_sub(1)
    }
}

/// Outcome of entering `Reconnecting`.
#[derive(Debug, Clone, PartialEq)]
pub struct Recovery {
    pub state: NegotiationState,
    pub effects: Vec<Effect>,
}

/// Attempt counter wrapped around the `Reconnecting` transition.
#[derive(Debug, Clone)]
pub struct ReconnectSupervisor {
    policy: RetryPolicy,
    attempt: u32,
}

impl ReconnectSupervisor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Tears the current transport down and schedules exactly one retry,
    /// or gives up once the budget is spent.
    pub fn begin(&mut self) -> Recovery {
        let mut effects = vec![Effect::CancelTimer, Effect::ReleaseTransport];

        if self.attempt >= self.policy.max_attempts {
            warn!(
                "Reconnection budget exhausted after {} attempt(s)",
                self.attempt
            );
            let err = SessionError::MaxRetriesExceeded {
                attempts: self.attempt,
            };
            effects.push(Effect::ReleaseMedia);
            effects.push(Effect::Notify(Notice::error(
                "Could not reconnect. Please try again.",
            )));
            effects.push(Effect::Fail(err));
            return Recovery {
                state: NegotiationState::Failed,
                effects,
            };
        }

        self.attempt += 1;
        let delay = self.policy.delay_for(self.attempt);
        info!(
            "Scheduling reconnection attempt {}/{} in {:?}",
            self.attempt, self.policy.max_attempts, delay
        );

        effects.push(Effect::ArmTimer(Timer {
            kind: TimerKind::Retry {
                attempt: self.attempt,
            },
            delay,
        }));
        effects.push(Effect::Notify(Notice::warning(format!(
            "Reconnecting (attempt {}/{})...",
            self.attempt, self.policy.max_attempts
        ))));

        Recovery {
            state: NegotiationState::Reconnecting,
            effects,
        }
    }

    /// Whether a fired retry timer still belongs to the pending attempt.
    pub fn is_current(&self, attempt: u32) -> bool {
        attempt == self.attempt
    }
}
