//! Polling an arbitrary command's output
//!
//! Each attempt runs the command once. Its trimmed stdout is the reported
//! state; a non-zero exit status means the status could not be determined.

use std::process::Stdio;

use settle_core::{
    CancellationToken, Observation, PollConfig, PollResult, ProbeError, ProbeResult,
    wait_for_state,
};
use tokio::process::Command;

/// Run `command` until its output lands in one of the configured states
pub async fn wait_for_command(
    config: &PollConfig,
    cancel: &CancellationToken,
    command: &[String],
) -> PollResult<String> {
    wait_for_state(config, cancel, || run_probe_command(command)).await
}

async fn run_probe_command(command: &[String]) -> ProbeResult<Observation<String>> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| ProbeError::new("No command given"))?;

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| ProbeError::new(format!("Failed to run {}", program)).with_cause(e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ProbeError::new(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(Observation::new(stdout.clone(), stdout))
}
