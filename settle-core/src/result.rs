//! PollResult - Terminal outcome of a poll session

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::probe::ProbeError;
use crate::state::{PollState, StateSet};

/// Why a session ended in `PollResult::Errored`
#[derive(Debug, Error)]
pub enum PollError {
    /// The probe could not determine the status (fail-fast policy)
    #[error("Probe failed: {0}")]
    Probe(#[from] ProbeError),

    /// The probe reported a state the configuration does not classify
    #[error("Unexpected state '{state}' (pending: {pending}, target: {target})")]
    UnexpectedState {
        state: PollState,
        pending: StateSet,
        target: StateSet,
    },

    /// The session was never started
    #[error("Invalid poll configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Terminal outcome of one poll session
///
/// Every session ends in exactly one of these variants.
#[derive(Debug)]
pub enum PollResult<T> {
    /// A target state was observed
    Succeeded(T),
    /// A failure state was observed
    Failed {
        payload: T,
        state: PollState,
        reason: Option<String>,
    },
    /// The deadline passed while the operation was still pending
    TimedOut {
        last_state: Option<PollState>,
        attempts: u32,
    },
    /// The status could not be determined
    Errored(PollError),
    /// The session's cancellation token was triggered
    Cancelled,
}

/// Payload-free kind of a [`PollResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollOutcome {
    Succeeded,
    Failed,
    TimedOut,
    Errored,
    Cancelled,
}

impl fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PollOutcome::Succeeded => "succeeded",
            PollOutcome::Failed => "failed",
            PollOutcome::TimedOut => "timed_out",
            PollOutcome::Errored => "errored",
            PollOutcome::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// [`PollResult`] without the success payload, for use with `?`
#[derive(Debug, Error)]
pub enum WaitError {
    #[error(
        "Operation failed with state '{state}': {}",
        .reason.as_deref().unwrap_or("no reason given")
    )]
    Failed {
        state: PollState,
        reason: Option<String>,
    },

    #[error(
        "Timed out after {attempts} attempts (last state: {})",
        .last_state.as_ref().map(|s| s.as_str()).unwrap_or("none")
    )]
    TimedOut {
        last_state: Option<PollState>,
        attempts: u32,
    },

    #[error(transparent)]
    Errored(#[from] PollError),

    #[error("Wait was cancelled")]
    Cancelled,
}

impl WaitError {
    pub fn outcome(&self) -> PollOutcome {
        match self {
            WaitError::Failed { .. } => PollOutcome::Failed,
            WaitError::TimedOut { .. } => PollOutcome::TimedOut,
            WaitError::Errored(_) => PollOutcome::Errored,
            WaitError::Cancelled => PollOutcome::Cancelled,
        }
    }
}

impl<T> PollResult<T> {
    pub fn outcome(&self) -> PollOutcome {
        match self {
            PollResult::Succeeded(_) => PollOutcome::Succeeded,
            PollResult::Failed { .. } => PollOutcome::Failed,
            PollResult::TimedOut { .. } => PollOutcome::TimedOut,
            PollResult::Errored(_) => PollOutcome::Errored,
            PollResult::Cancelled => PollOutcome::Cancelled,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PollResult::Succeeded(_))
    }

    /// Payload of a `Succeeded` or `Failed` outcome
    pub fn payload(&self) -> Option<&T> {
        match self {
            PollResult::Succeeded(payload) | PollResult::Failed { payload, .. } => Some(payload),
            _ => None,
        }
    }

    /// Convert into a `Result`, dropping the payload of a failure
    pub fn into_result(self) -> Result<T, WaitError> {
        match self {
            PollResult::Succeeded(payload) => Ok(payload),
            PollResult::Failed { state, reason, .. } => Err(WaitError::Failed { state, reason }),
            PollResult::TimedOut {
                last_state,
                attempts,
            } => Err(WaitError::TimedOut {
                last_state,
                attempts,
            }),
            PollResult::Errored(e) => Err(WaitError::Errored(e)),
            PollResult::Cancelled => Err(WaitError::Cancelled),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PollResult<U> {
        match self {
            PollResult::Succeeded(payload) => PollResult::Succeeded(f(payload)),
            PollResult::Failed {
                payload,
                state,
                reason,
            } => PollResult::Failed {
                payload: f(payload),
                state,
                reason,
            },
            PollResult::TimedOut {
                last_state,
                attempts,
            } => PollResult::TimedOut {
                last_state,
                attempts,
            },
            PollResult::Errored(e) => PollResult::Errored(e),
            PollResult::Cancelled => PollResult::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_result_succeeded() {
        let result: PollResult<&str> = PollResult::Succeeded("vpc-123");
        assert!(result.is_success());
        assert_eq!(result.into_result().unwrap(), "vpc-123");
    }

    #[test]
    fn test_into_result_failed_keeps_reason() {
        let result = PollResult::Failed {
            payload: 1,
            state: PollState::new("FAILED"),
            reason: Some("AlreadyExists".to_string()),
        };
        assert_eq!(result.payload(), Some(&1));

        let err = result.into_result().unwrap_err();
        assert_eq!(err.outcome(), PollOutcome::Failed);
        assert_eq!(
            err.to_string(),
            "Operation failed with state 'FAILED': AlreadyExists"
        );
    }

    #[test]
    fn test_timed_out_message() {
        let err = PollResult::<()>::TimedOut {
            last_state: Some(PollState::new("Accepted")),
            attempts: 4,
        }
        .into_result()
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Timed out after 4 attempts (last state: Accepted)"
        );

        let err = WaitError::TimedOut {
            last_state: None,
            attempts: 0,
        };
        assert_eq!(err.to_string(), "Timed out after 0 attempts (last state: none)");
    }

    #[test]
    fn test_errored_message() {
        let err = PollError::UnexpectedState {
            state: PollState::new("FrobnicatingXYZ"),
            pending: ["Accepted"].into_iter().collect(),
            target: ["Succeeded"].into_iter().collect(),
        };
        assert_eq!(
            WaitError::from(err).to_string(),
            "Unexpected state 'FrobnicatingXYZ' (pending: [Accepted], target: [Succeeded])"
        );
    }

    #[test]
    fn test_map_preserves_outcome() {
        let result = PollResult::Failed {
            payload: 2,
            state: PollState::new("Failed"),
            reason: None,
        }
        .map(|n| n * 10);
        assert_eq!(result.outcome(), PollOutcome::Failed);
        assert_eq!(result.payload(), Some(&20));

        let cancelled = PollResult::<u8>::Cancelled.map(|n| n + 1);
        assert_eq!(cancelled.outcome(), PollOutcome::Cancelled);
    }

    #[test]
    fn test_outcome_serialization() {
        assert_eq!(
            serde_json::to_string(&PollOutcome::TimedOut).unwrap(),
            "\"timed_out\""
        );
        assert_eq!(PollOutcome::Cancelled.to_string(), "cancelled");
    }
}
