//! Settle AWS Cloud Control Provider
//!
//! Submits Cloud Control API requests and waits for them to settle.
//!
//! ## Module Structure
//!
//! - `operation` - Mapping from Cloud Control progress events to poll states
//! - `provider` - AwsccProvider implementation
//! - `error` - Error type for submit-and-wait operations

pub mod error;
pub mod operation;
pub mod provider;

// Re-export main types
pub use error::{CloudControlError, CloudControlResult};
pub use operation::{observe, operation_poll_config};
pub use provider::AwsccProvider;
