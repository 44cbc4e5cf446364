//! Poller - Drive a probe until the operation it watches settles

use std::future::Future;

use log::{debug, info, warn};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::{PollConfig, ProbeErrorPolicy, StateClass};
use crate::probe::{Observation, ProbeResult};
use crate::result::{PollError, PollResult};
use crate::state::PollState;

/// Invoke `probe` until its state settles, the deadline passes, or `cancel` fires
///
/// The first probe call happens immediately. While the reported state is
/// pending, the poller sleeps `config.min_interval` (capped by the time left
/// before `config.timeout`) between calls. Cancellation interrupts the sleep
/// but never an in-flight probe call, so a probe that can block should bound
/// its own request time.
pub async fn wait_for_state<T, F, Fut>(
    config: &PollConfig,
    cancel: &CancellationToken,
    mut probe: F,
) -> PollResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeResult<Observation<T>>>,
{
    if let Err(e) = config.validate() {
        return PollResult::Errored(PollError::InvalidConfig(e));
    }
    if config.timeout <= config.min_interval {
        warn!(
            "Poll timeout {:?} does not exceed interval {:?}; at most one attempt will be made",
            config.timeout, config.min_interval
        );
    }

    let started = Instant::now();
    // A timeout too large to represent never expires
    let deadline = started.checked_add(config.timeout);
    let mut attempts: u32 = 0;
    let mut last_state = None;

    loop {
        if cancel.is_cancelled() {
            info!("Poll cancelled after {} attempts", attempts);
            return PollResult::Cancelled;
        }

        attempts += 1;
        match probe().await {
            Ok(observation) => {
                debug!(
                    "Poll attempt {} observed state '{}'",
                    attempts, observation.state
                );
                match config.classify(&observation.state) {
                    StateClass::Target => {
                        info!(
                            "Reached state '{}' after {} attempts in {:?}",
                            observation.state,
                            attempts,
                            started.elapsed()
                        );
                        return PollResult::Succeeded(observation.payload);
                    }
                    StateClass::Failure => {
                        warn!(
                            "Operation failed with state '{}' after {} attempts",
                            observation.state, attempts
                        );
                        return PollResult::Failed {
                            payload: observation.payload,
                            state: observation.state,
                            reason: observation.message,
                        };
                    }
                    StateClass::Unknown => {
                        return PollResult::Errored(PollError::UnexpectedState {
                            state: observation.state,
                            pending: config.pending.clone(),
                            target: config.target.clone(),
                        });
                    }
                    StateClass::Pending => last_state = Some(observation.state),
                }
            }
            Err(e) => match config.probe_error_policy {
                ProbeErrorPolicy::FailFast => return PollResult::Errored(PollError::Probe(e)),
                ProbeErrorPolicy::RetryUntilTimeout => {
                    warn!("Poll attempt {} failed, retrying: {}", attempts, e);
                }
            },
        }

        let now = Instant::now();
        let delay = match deadline {
            Some(deadline) if now >= deadline => return timed_out(last_state, attempts),
            Some(deadline) => config.min_interval.min(deadline - now),
            None => config.min_interval,
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Poll cancelled after {} attempts", attempts);
                return PollResult::Cancelled;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return timed_out(last_state, attempts);
        }
    }
}

fn timed_out<T>(last_state: Option<PollState>, attempts: u32) -> PollResult<T> {
    warn!(
        "Timed out after {} attempts (last state: {})",
        attempts,
        last_state.as_ref().map(|s| s.as_str()).unwrap_or("none")
    );
    PollResult::TimedOut {
        last_state,
        attempts,
    }
}
