//! PollConfig - Immutable settings for one poll session

use std::time::Duration;

use thiserror::Error;

use crate::state::{PollState, StateSet};

/// Default wait between probe invocations (5 seconds)
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(5);

/// Default overall deadline for a poll session (10 minutes)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Default terminal failure marker
pub const DEFAULT_FAILURE_STATE: &str = "Failed";

/// What the poller does when the probe itself returns an error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeErrorPolicy {
    /// Surface the error as `PollResult::Errored` immediately
    #[default]
    FailFast,
    /// Log the error and keep polling until the deadline
    RetryUntilTimeout,
}

/// How a single observed state relates to a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateClass {
    Pending,
    Target,
    Failure,
    Unknown,
}

/// Errors detected when validating a [`PollConfig`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No target state means the session can never succeed
    #[error("At least one target state is required")]
    NoTargetStates,

    /// A state appears in two classification sets
    #[error("State '{state}' is listed as both {first} and {second}")]
    OverlappingStates {
        state: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("Poll interval must be greater than zero")]
    ZeroInterval,

    #[error("Poll timeout must be greater than zero")]
    ZeroTimeout,
}

/// Configuration for one poll session
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// States meaning the operation is still in progress
    pub pending: StateSet,
    /// States meaning the operation completed successfully
    pub target: StateSet,
    /// States meaning the operation failed for good
    pub failure: StateSet,
    /// Wait between probe invocations (capped by the remaining time)
    pub min_interval: Duration,
    /// Overall deadline measured from the start of the session
    pub timeout: Duration,
    pub probe_error_policy: ProbeErrorPolicy,
}

impl PollConfig {
    /// Create a configuration with the default failure marker, interval and timeout
    pub fn new<P, T>(pending: P, target: T) -> Self
    where
        P: IntoIterator,
        P::Item: Into<PollState>,
        T: IntoIterator,
        T::Item: Into<PollState>,
    {
        Self {
            pending: pending.into_iter().collect(),
            target: target.into_iter().collect(),
            failure: [DEFAULT_FAILURE_STATE].into_iter().collect(),
            min_interval: DEFAULT_MIN_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
            probe_error_policy: ProbeErrorPolicy::default(),
        }
    }

    /// Replace the failure markers (an empty set disables failure detection)
    pub fn with_failure_states<F>(mut self, failure: F) -> Self
    where
        F: IntoIterator,
        F::Item: Into<PollState>,
    {
        self.failure = failure.into_iter().collect();
        self
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_probe_error_policy(mut self, policy: ProbeErrorPolicy) -> Self {
        self.probe_error_policy = policy;
        self
    }

    /// Classify an observed state against the configured sets
    pub fn classify(&self, state: &PollState) -> StateClass {
        if self.target.contains(state) {
            StateClass::Target
        } else if self.failure.contains(state) {
            StateClass::Failure
        } else if self.pending.contains(state) {
            StateClass::Pending
        } else {
            StateClass::Unknown
        }
    }

    /// Check that the configuration describes a session that can terminate sensibly
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target.is_empty() {
            return Err(ConfigError::NoTargetStates);
        }

        let pairs = [
            (&self.pending, "pending", &self.target, "target"),
            (&self.pending, "pending", &self.failure, "failure"),
            (&self.target, "target", &self.failure, "failure"),
        ];
        for (a, first, b, second) in pairs {
            if let Some(state) = a.overlap(b) {
                return Err(ConfigError::OverlappingStates {
                    state: state.to_string(),
                    first,
                    second,
                });
            }
        }

        if self.min_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(())
    }
}
