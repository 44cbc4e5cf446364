//! Probe - What a status check reports back to the poller
//!
//! A probe is any closure returning a future of `ProbeResult<Observation<T>>`.
//! It captures whatever client handle it needs; the poller knows nothing about
//! transport or authentication.

use crate::state::PollState;

/// One status observation returned by a probe
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<T> {
    /// Opaque data handed back verbatim in `Succeeded` / `Failed`
    pub payload: T,
    pub state: PollState,
    /// Human-readable detail, used as the reason when the state is a failure
    pub message: Option<String>,
}

impl<T> Observation<T> {
    pub fn new(payload: T, state: impl Into<PollState>) -> Self {
        Self {
            payload,
            state: state.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Error returned when the probe could not determine the status at all
#[derive(Debug)]
pub struct ProbeError {
    pub message: String,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProbeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProbeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }
}

pub type ProbeResult<T> = Result<T, ProbeError>;
