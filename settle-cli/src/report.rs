//! Printing poll outcomes and mapping them to exit codes

use colored::Colorize;
use serde::Serialize;
use settle_core::{PollOutcome, PollResult, WaitError};
use settle_provider_awscc::CloudControlError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// What the CLI prints once a session ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub outcome: PollOutcome,
    pub state: Option<String>,
    pub detail: Option<String>,
}

impl Report {
    /// Build a report from a poll result; `describe` extracts the state and detail of a payload
    pub fn from_poll<T>(
        result: PollResult<T>,
        describe: impl FnOnce(&T) -> (Option<String>, Option<String>),
    ) -> Self {
        let outcome = result.outcome();
        match result {
            PollResult::Succeeded(payload) => {
                let (state, detail) = describe(&payload);
                Self {
                    outcome,
                    state,
                    detail,
                }
            }
            PollResult::Failed { state, reason, .. } => Self {
                outcome,
                state: Some(state.to_string()),
                detail: reason,
            },
            PollResult::TimedOut {
                last_state,
                attempts,
            } => Self {
                outcome,
                state: last_state.map(|s| s.to_string()),
                detail: Some(format!("gave up after {} attempts", attempts)),
            },
            PollResult::Errored(e) => Self {
                outcome,
                state: None,
                detail: Some(e.to_string()),
            },
            PollResult::Cancelled => Self {
                outcome,
                state: None,
                detail: None,
            },
        }
    }

    /// Build a report from a submit-and-wait operation
    pub fn from_operation(result: Result<Option<String>, CloudControlError>) -> Self {
        match result {
            Ok(detail) => Self {
                outcome: PollOutcome::Succeeded,
                state: Some("SUCCESS".to_string()),
                detail,
            },
            Err(e) => {
                let state = match &e {
                    CloudControlError::Wait(WaitError::Failed { state, .. }) => {
                        Some(state.to_string())
                    }
                    CloudControlError::Wait(WaitError::TimedOut { last_state, .. }) => {
                        last_state.as_ref().map(|s| s.to_string())
                    }
                    _ => None,
                };
                Self {
                    outcome: e.outcome(),
                    state,
                    detail: Some(e.to_string()),
                }
            }
        }
    }

    pub fn exit_code(&self) -> i32 {
        exit_code(self.outcome)
    }

    pub fn print(&self, format: OutputFormat) {
        match format {
            OutputFormat::Json => match serde_json::to_string(self) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("{} {}", "Error:".red().bold(), e),
            },
            OutputFormat::Text => self.print_text(),
        }
    }

    fn print_text(&self) {
        let headline = match self.outcome {
            PollOutcome::Succeeded => format!("{} Succeeded", "✓".green()),
            PollOutcome::Failed => format!("{} Failed", "✗".red()),
            PollOutcome::TimedOut => format!("{} Timed out", "⏱".yellow()),
            PollOutcome::Errored => format!("{} Errored", "✗".red()),
            PollOutcome::Cancelled => format!("{}", "Cancelled.".yellow()),
        };
        match &self.state {
            Some(state) => println!("{} (state: {})", headline, state.bold()),
            None => println!("{}", headline),
        }
        if let Some(detail) = &self.detail {
            println!("  {}", detail);
        }
    }
}

/// 0 succeeded, 1 failed, 2 timed out, 3 errored, 130 cancelled
pub fn exit_code(outcome: PollOutcome) -> i32 {
    match outcome {
        PollOutcome::Succeeded => 0,
        PollOutcome::Failed => 1,
        PollOutcome::TimedOut => 2,
        PollOutcome::Errored => 3,
        PollOutcome::Cancelled => 130,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use settle_core::PollState;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(PollOutcome::Succeeded), 0);
        assert_eq!(exit_code(PollOutcome::Failed), 1);
        assert_eq!(exit_code(PollOutcome::TimedOut), 2);
        assert_eq!(exit_code(PollOutcome::Errored), 3);
        assert_eq!(exit_code(PollOutcome::Cancelled), 130);
    }

    #[test]
    fn test_report_from_timed_out() {
        let result: PollResult<String> = PollResult::TimedOut {
            last_state: Some(PollState::new("IN_PROGRESS")),
            attempts: 12,
        };
        let report = Report::from_poll(result, |_| (None, None));
        assert_eq!(report.outcome, PollOutcome::TimedOut);
        assert_eq!(report.state.as_deref(), Some("IN_PROGRESS"));
        assert_eq!(report.detail.as_deref(), Some("gave up after 12 attempts"));
        assert_eq!(report.exit_code(), 2);
    }

    #[test]
    fn test_report_from_succeeded_uses_describe() {
        let result = PollResult::Succeeded("ready".to_string());
        let report = Report::from_poll(result, |out| (Some(out.clone()), None));
        assert_eq!(report.state.as_deref(), Some("ready"));
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_report_from_failed_operation() {
        let err = CloudControlError::Wait(WaitError::Failed {
            state: PollState::new("FAILED"),
            reason: Some("AlreadyExists".to_string()),
        });
        let report = Report::from_operation(Err(err));
        assert_eq!(report.outcome, PollOutcome::Failed);
        assert_eq!(report.state.as_deref(), Some("FAILED"));
        assert!(report.detail.unwrap().contains("AlreadyExists"));
    }

    #[test]
    fn test_report_json() {
        let report = Report {
            outcome: PollOutcome::Cancelled,
            state: None,
            detail: None,
        };
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"{"outcome":"cancelled","state":null,"detail":null}"#
        );
    }
}
