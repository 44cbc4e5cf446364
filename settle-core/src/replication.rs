//! Waiting for a paired messaging namespace to finish replicating
//!
//! After a geo-disaster-recovery alias is created between two premium
//! namespaces, the alias sits in `Accepted` until the pairing completes. Other
//! changes to the namespace fail while replication is in flight, so callers
//! wait for `Succeeded` first.
//!
//! The caller supplies the management API client by implementing
//! [`ReplicationClient`].

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::config::PollConfig;
use crate::poller::wait_for_state;
use crate::probe::{Observation, ProbeError, ProbeResult};
use crate::result::{PollError, WaitError};

/// Only premium namespaces support disaster recovery pairing
pub const PREMIUM_SKU: &str = "Premium";

/// Replication status is checked every 30 seconds
pub const REPLICATION_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Location of a messaging namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRef {
    pub resource_group: String,
    pub namespace: String,
}

impl NamespaceRef {
    pub fn new(resource_group: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            resource_group: resource_group.into(),
            namespace: namespace.into(),
        }
    }
}

impl std::fmt::Display for NamespaceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Namespace {:?} / Resource Group {:?}",
            self.namespace, self.resource_group
        )
    }
}

/// Current status of a disaster recovery alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasStatus {
    pub name: String,
    /// `None` when the service has not reported a provisioning state yet
    pub provisioning_state: Option<String>,
}

/// Management API calls needed to follow a namespace pairing
#[async_trait]
pub trait ReplicationClient: Send + Sync {
    /// SKU name of the namespace (e.g., "Premium", "Standard")
    async fn namespace_sku(&self, namespace: &NamespaceRef) -> ProbeResult<String>;

    /// Names of the disaster recovery aliases configured on the namespace
    async fn list_aliases(&self, namespace: &NamespaceRef) -> ProbeResult<Vec<String>>;

    /// Current status of one alias
    async fn alias_status(&self, namespace: &NamespaceRef, alias: &str)
    -> ProbeResult<AliasStatus>;
}

/// Poll configuration used for alias replication
pub fn replication_poll_config(timeout: Duration) -> PollConfig {
    PollConfig::new(["Accepted"], ["Succeeded"])
        .with_failure_states(["Failed"])
        .with_min_interval(REPLICATION_POLL_INTERVAL)
        .with_timeout(timeout)
}

/// Wait until the namespace's single disaster recovery alias has replicated
///
/// Returns `Ok(None)` when there is nothing to wait for: the namespace is not
/// premium, or it does not have exactly one alias.
pub async fn wait_for_paired_namespace_replication<C>(
    client: &C,
    namespace: &NamespaceRef,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Option<AliasStatus>, WaitError>
where
    C: ReplicationClient + ?Sized,
{
    let sku = client
        .namespace_sku(namespace)
        .await
        .map_err(PollError::Probe)?;
    if !sku.eq_ignore_ascii_case(PREMIUM_SKU) {
        debug!("Skipping replication wait for {} (sku {})", namespace, sku);
        return Ok(None);
    }

    let aliases = client
        .list_aliases(namespace)
        .await
        .map_err(PollError::Probe)?;
    let alias = match aliases.as_slice() {
        [alias] => alias.clone(),
        _ => {
            debug!(
                "Skipping replication wait for {} ({} aliases)",
                namespace,
                aliases.len()
            );
            return Ok(None);
        }
    };

    let config = replication_poll_config(timeout);
    let status = wait_for_state(&config, cancel, || {
        observe_alias(client, namespace, &alias)
    })
    .await
    .into_result()?;

    Ok(Some(status))
}

async fn observe_alias<C>(
    client: &C,
    namespace: &NamespaceRef,
    alias: &str,
) -> ProbeResult<Observation<AliasStatus>>
where
    C: ReplicationClient + ?Sized,
{
    let status = client.alias_status(namespace, alias).await.map_err(|e| {
        ProbeError::new(format!(
            "Failed to read Disaster Recovery Config {:?} ({})",
            alias, namespace
        ))
        .with_cause(e)
    })?;

    let state = status.provisioning_state.clone().ok_or_else(|| {
        ProbeError::new(format!(
            "Disaster Recovery Config {:?} ({}) has no provisioning state",
            alias, namespace
        ))
    })?;

    let observation = Observation::new(status, state.clone());
    if state.eq_ignore_ascii_case("Failed") {
        Ok(observation.with_message(format!(
            "Replication for Disaster Recovery Config {:?} ({}) failed",
            alias, namespace
        )))
    } else {
        Ok(observation)
    }
}
