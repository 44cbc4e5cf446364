//! Cloud Control request status as poll states

use std::time::Duration;

use aws_sdk_cloudcontrol::types::{OperationStatus, ProgressEvent};
use settle_core::{Observation, PollConfig};

/// Default wait between request status checks
pub const DEFAULT_OPERATION_INTERVAL: Duration = Duration::from_secs(5);

/// Default deadline for one Cloud Control operation (10 minutes)
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(600);

/// Reported when a progress event carries no operation status
pub const UNKNOWN_STATUS: &str = "UNKNOWN";

/// Poll configuration for a Cloud Control request token
pub fn operation_poll_config(min_interval: Duration, timeout: Duration) -> PollConfig {
    PollConfig::new(
        [
            OperationStatus::Pending.as_str(),
            OperationStatus::InProgress.as_str(),
            OperationStatus::CancelInProgress.as_str(),
        ],
        [OperationStatus::Success.as_str()],
    )
    .with_failure_states([
        OperationStatus::Failed.as_str(),
        OperationStatus::CancelComplete.as_str(),
    ])
    .with_min_interval(min_interval)
    .with_timeout(timeout)
}

/// Turn a progress event into an observation carrying the event itself
pub fn observe(progress: ProgressEvent) -> Observation<ProgressEvent> {
    let state = progress
        .operation_status()
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_STATUS.to_string());
    let message = failure_message(&progress);

    let observation = Observation::new(progress, state);
    match message {
        Some(message) => observation.with_message(message),
        None => observation,
    }
}

/// Error code and status message of a progress event, if any
fn failure_message(progress: &ProgressEvent) -> Option<String> {
    match (progress.error_code(), progress.status_message()) {
        (Some(code), Some(msg)) => Some(format!("{}: {}", code.as_str(), msg)),
        (Some(code), None) => Some(code.as_str().to_string()),
        (None, Some(msg)) => Some(msg.to_string()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_cloudcontrol::types::HandlerErrorCode;
    use settle_core::StateClass;

    fn event(status: OperationStatus) -> ProgressEvent {
        ProgressEvent::builder()
            .operation_status(status)
            .identifier("vpc-0123456789abcdef0")
            .request_token("token-1")
            .build()
    }

    #[test]
    fn test_operation_poll_config_classification() {
        let config = operation_poll_config(DEFAULT_OPERATION_INTERVAL, DEFAULT_OPERATION_TIMEOUT);
        assert!(config.validate().is_ok());

        for (status, class) in [
            (OperationStatus::Pending, StateClass::Pending),
            (OperationStatus::InProgress, StateClass::Pending),
            (OperationStatus::CancelInProgress, StateClass::Pending),
            (OperationStatus::Success, StateClass::Target),
            (OperationStatus::Failed, StateClass::Failure),
            (OperationStatus::CancelComplete, StateClass::Failure),
        ] {
            assert_eq!(config.classify(&status.as_str().into()), class, "{:?}", status);
        }
        assert_eq!(
            config.classify(&UNKNOWN_STATUS.into()),
            StateClass::Unknown
        );
    }

    #[test]
    fn test_observe_success() {
        let obs = observe(event(OperationStatus::Success));
        assert_eq!(obs.state.as_str(), "SUCCESS");
        assert!(obs.message.is_none());
        assert_eq!(obs.payload.identifier(), Some("vpc-0123456789abcdef0"));
    }

    #[test]
    fn test_observe_failure_message() {
        let progress = ProgressEvent::builder()
            .operation_status(OperationStatus::Failed)
            .error_code(HandlerErrorCode::AlreadyExists)
            .status_message("VPC already exists")
            .build();
        let obs = observe(progress);
        assert_eq!(obs.state.as_str(), "FAILED");
        assert_eq!(
            obs.message.as_deref(),
            Some("AlreadyExists: VPC already exists")
        );
    }

    #[test]
    fn test_observe_missing_status() {
        let obs = observe(ProgressEvent::builder().build());
        assert_eq!(obs.state.as_str(), UNKNOWN_STATUS);
    }
}
