//! Bounded polling of an assistant run until it reaches a terminal state.

use std::thread;
use std::time::Duration;

use faqdesk_core::config::AssistantSettings;

use crate::api::{AssistantApi, RunStatus};
use crate::error::AssistantError;

/// Exponential backoff between status polls.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from(&AssistantSettings::default())
    }
}

impl From<&AssistantSettings> for PollPolicy {
    fn from(s: &AssistantSettings) -> Self {
        Self {
            max_attempts: s.poll_max_attempts.max(1),
            initial_delay: Duration::from_millis(s.poll_initial_delay_ms),
            max_delay: Duration::from_millis(s.poll_max_delay_ms),
            multiplier: s.poll_multiplier,
        }
    }
}

impl PollPolicy {
    /// No sleeping at all. Useful against in-process fakes.
    pub fn immediate(max_attempts: u32) -> Self {
        Self { max_attempts: max_attempts.max(1), initial_delay: Duration::ZERO, max_delay: Duration::ZERO, multiplier: 1.0 }
    }

    /// Delay after the poll numbered `attempt` (0-based), capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = if self.multiplier.is_finite() && self.multiplier >= 1.0 { self.multiplier } else { 1.0 };
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * f64::from(factor).powi(exp);
        let capped = secs.min(self.max_delay.as_secs_f64());
        Duration::try_from_secs_f64(capped).unwrap_or(self.max_delay)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Submitted,
    Polling { attempt: u32 },
    Completed,
    Failed(RunStatus),
    TimedOut { attempts: u32 },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed(_) | RunState::TimedOut { .. })
    }

    /// Next state after poll number `attempt` observed `status`.
    pub fn observe(attempt: u32, status: &RunStatus, policy: &PollPolicy) -> RunState {
        if *status == RunStatus::Completed {
            RunState::Completed
        } else if status.is_failure() {
            RunState::Failed(status.clone())
        } else if attempt + 1 >= policy.max_attempts {
            RunState::TimedOut { attempts: attempt + 1 }
        } else {
            RunState::Polling { attempt: attempt + 1 }
        }
    }

    pub fn into_result(self) -> Result<(), AssistantError> {
        match self {
            RunState::Completed => Ok(()),
            RunState::Failed(status) => Err(AssistantError::RunFailed(status)),
            RunState::TimedOut { attempts } => Err(AssistantError::TimedOut { attempts }),
            other => Err(AssistantError::Protocol(format!("run left in non-terminal state {other:?}"))),
        }
    }
}

pub struct RunPoller<'a> {
    api: &'a dyn AssistantApi,
    policy: &'a PollPolicy,
}

impl<'a> RunPoller<'a> {
    pub fn new(api: &'a dyn AssistantApi, policy: &'a PollPolicy) -> Self {
        Self { api, policy }
    }

    /// Drive the run to a terminal state. Transport errors abort immediately.
    pub fn wait(&self, thread_id: &str, run_id: &str) -> Result<RunState, AssistantError> {
        let mut state = RunState::Submitted;
        loop {
            state = match state {
                RunState::Submitted => RunState::Polling { attempt: 0 },
                RunState::Polling { attempt } => {
                    if attempt > 0 {
                        thread::sleep(self.policy.delay_for(attempt - 1));
                    }
                    let status = self.api.run_status(thread_id, run_id)?;
                    tracing::debug!(run_id, attempt, %status, "run status");
                    RunState::observe(attempt, &status, self.policy)
                }
                terminal => {
                    match &terminal {
                        RunState::Completed => tracing::info!(run_id, "run completed"),
                        other => tracing::warn!(run_id, state = ?other, "run did not complete"),
                    }
                    return Ok(terminal);
                }
            };
        }
    }
}
