//! Settle Core
//!
//! Core library for waiting on asynchronous cloud operations.
//!
//! A cloud management API usually answers a mutating request with a token and
//! finishes the work in the background. Callers supply a *probe* that reports
//! the current status of that work, and [`wait_for_state`] drives the probe
//! until the status lands in one of the caller's target states, a failure
//! state, an unknown state, the deadline passes, or the session is cancelled.
//!
//! # Example
//!
//! ```ignore
//! use settle_core::{wait_for_state, Observation, PollConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = PollConfig::new(["Accepted"], ["Succeeded"])
//!     .with_min_interval(Duration::from_secs(30))
//!     .with_timeout(Duration::from_secs(1800));
//!
//! let result = wait_for_state(&config, &CancellationToken::new(), || {
//!     let client = client.clone();
//!     async move {
//!         let alias = client.get_alias().await?;
//!         Ok(Observation::new(alias.clone(), alias.provisioning_state))
//!     }
//! })
//! .await;
//! ```

pub mod config;
pub mod poller;
pub mod probe;
pub mod replication;
pub mod result;
pub mod state;

// Re-export main types for convenience
pub use config::{ConfigError, PollConfig, ProbeErrorPolicy, StateClass};
pub use poller::wait_for_state;
pub use probe::{Observation, ProbeError, ProbeResult};
pub use result::{PollError, PollOutcome, PollResult, WaitError};
pub use state::{PollState, StateSet};
pub use tokio_util::sync::CancellationToken;
