//! AWS Cloud Control Provider implementation
//!
//! This module submits requests to the AWS Cloud Control API and waits for
//! the resulting operations to settle.

use std::time::Duration;

use aws_config::Region;
use aws_sdk_cloudcontrol::Client as CloudControlClient;
use aws_sdk_cloudcontrol::types::ProgressEvent;
use log::info;
use settle_core::{
    CancellationToken, Observation, PollConfig, PollResult, ProbeError, ProbeResult,
    wait_for_state,
};

use crate::error::{CloudControlError, CloudControlResult};
use crate::operation::{
    DEFAULT_OPERATION_INTERVAL, DEFAULT_OPERATION_TIMEOUT, observe, operation_poll_config,
};

/// AWS Cloud Control Provider
pub struct AwsccProvider {
    cloudcontrol_client: CloudControlClient,
    poll_interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
}

impl AwsccProvider {
    /// Create a new AwsccProvider, optionally overriding the default region
    pub async fn new(region: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;

        Self::from_client(CloudControlClient::new(&config))
    }

    pub fn from_client(client: CloudControlClient) -> Self {
        Self {
            cloudcontrol_client: client,
            poll_interval: DEFAULT_OPERATION_INTERVAL,
            timeout: DEFAULT_OPERATION_TIMEOUT,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Stop waiting on operations when `cancel` is triggered
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Poll configuration used for every request token this provider waits on
    pub fn operation_poll_config(&self) -> PollConfig {
        operation_poll_config(self.poll_interval, self.timeout)
    }

    // =========================================================================
    // Cloud Control API Methods
    // =========================================================================

    /// Create a resource and wait for it, returning its primary identifier
    pub async fn cc_create_resource(
        &self,
        type_name: &str,
        desired_state: serde_json::Value,
    ) -> CloudControlResult<String> {
        let result = self
            .cloudcontrol_client
            .create_resource()
            .type_name(type_name)
            .desired_state(desired_state.to_string())
            .send()
            .await
            .map_err(|e| CloudControlError::request("create", e))?;

        let request_token = result
            .progress_event()
            .and_then(|p| p.request_token())
            .ok_or(CloudControlError::MissingRequestToken)?;

        info!("Creating {} (request {})", type_name, request_token);
        let progress = self.wait_for_request(request_token).await.into_result()?;
        created_identifier(type_name, &progress)
    }

    /// Apply JSON Patch operations to a resource and wait for the update
    pub async fn cc_update_resource(
        &self,
        type_name: &str,
        identifier: &str,
        patch_ops: Vec<serde_json::Value>,
    ) -> CloudControlResult<()> {
        if patch_ops.is_empty() {
            return Ok(());
        }

        let patch_document = serde_json::to_string(&patch_ops)?;

        let result = self
            .cloudcontrol_client
            .update_resource()
            .type_name(type_name)
            .identifier(identifier)
            .patch_document(patch_document)
            .send()
            .await
            .map_err(|e| CloudControlError::request("update", e))?;

        if let Some(request_token) = result.progress_event().and_then(|p| p.request_token()) {
            info!(
                "Updating {} {} (request {})",
                type_name, identifier, request_token
            );
            self.wait_for_request(request_token).await.into_result()?;
        }

        Ok(())
    }

    /// Delete a resource and wait for the deletion
    pub async fn cc_delete_resource(
        &self,
        type_name: &str,
        identifier: &str,
    ) -> CloudControlResult<()> {
        let result = self
            .cloudcontrol_client
            .delete_resource()
            .type_name(type_name)
            .identifier(identifier)
            .send()
            .await
            .map_err(|e| CloudControlError::request("delete", e))?;

        if let Some(request_token) = result.progress_event().and_then(|p| p.request_token()) {
            info!(
                "Deleting {} {} (request {})",
                type_name, identifier, request_token
            );
            self.wait_for_request(request_token).await.into_result()?;
        }

        Ok(())
    }

    /// Wait for a Cloud Control operation to settle
    pub async fn wait_for_request(&self, request_token: &str) -> PollResult<ProgressEvent> {
        let config = self.operation_poll_config();
        let client = &self.cloudcontrol_client;
        wait_for_state(&config, &self.cancel, move || {
            request_status(client, request_token)
        })
        .await
    }
}

/// Probe: fetch the current progress event for a request token
fn created_identifier(type_name: &str, progress: &ProgressEvent) -> CloudControlResult<String> {
    match progress.identifier() {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(CloudControlError::MissingIdentifier {
            type_name: type_name.to_string(),
        }),
    }
}

async fn request_status(
    client: &CloudControlClient,
    request_token: &str,
) -> ProbeResult<Observation<ProgressEvent>> {
    let status = client
        .get_resource_request_status()
        .request_token(request_token)
        .send()
        .await
        .map_err(|e| ProbeError::new(format!("Failed to get operation status: {:?}", e)))?;

    let progress = status.progress_event().cloned().ok_or_else(|| {
        ProbeError::new(format!(
            "No progress event returned for request {}",
            request_token
        ))
    })?;

    Ok(observe(progress))
}
