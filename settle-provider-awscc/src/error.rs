//! Error type for Cloud Control submit-and-wait operations

use settle_core::{PollOutcome, WaitError};
use thiserror::Error;

/// Errors returned by [`crate::AwsccProvider`] operations
#[derive(Debug, Error)]
pub enum CloudControlError {
    /// The create/update/delete request itself was rejected
    #[error("Failed to {action} resource: {message}")]
    Request {
        action: &'static str,
        message: String,
    },

    /// The API accepted the request but returned nothing to wait on
    #[error("No request token returned")]
    MissingRequestToken,

    /// A create settled successfully but reported no primary identifier
    #[error("No identifier returned for created {type_name} resource")]
    MissingIdentifier { type_name: String },

    #[error("Failed to build patch: {0}")]
    Patch(#[from] serde_json::Error),

    /// The request was submitted but did not settle successfully
    #[error("Operation did not complete: {0}")]
    Wait(#[from] WaitError),
}

impl CloudControlError {
    pub fn request(action: &'static str, err: impl std::fmt::Debug) -> Self {
        Self::Request {
            action,
            message: format!("{:?}", err),
        }
    }

    /// Poll outcome this error corresponds to
    pub fn outcome(&self) -> PollOutcome {
        match self {
            CloudControlError::Wait(e) => e.outcome(),
            _ => PollOutcome::Errored,
        }
    }
}

pub type CloudControlResult<T> = Result<T, CloudControlError>;
