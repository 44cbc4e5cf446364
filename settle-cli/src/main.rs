use std::fs;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;

use settle_core::{CancellationToken, PollConfig, ProbeErrorPolicy};
use settle_provider_awscc::AwsccProvider;

mod exec;
mod report;

use report::{OutputFormat, Report};

#[derive(Parser)]
#[command(name = "settle")]
#[command(about = "Wait for asynchronous cloud operations to settle", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Wait between status checks (e.g. 500ms, 5s, 1m)
    #[arg(long, global = true, default_value = "5s", value_parser = parse_duration)]
    interval: Duration,

    /// Give up after this long (e.g. 90s, 10m, 1h)
    #[arg(long, global = true, default_value = "10m", value_parser = parse_duration)]
    timeout: Duration,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait for an in-flight Cloud Control request
    Request {
        /// Request token returned by Cloud Control
        token: String,

        /// AWS region (defaults to the environment's region)
        #[arg(long)]
        region: Option<String>,
    },
    /// Create a resource through Cloud Control and wait for it
    Create {
        /// CloudFormation type name (e.g. AWS::EC2::VPC)
        #[arg(long)]
        type_name: String,

        /// Desired state as JSON, or @path to a JSON file
        #[arg(long)]
        desired_state: String,

        #[arg(long)]
        region: Option<String>,
    },
    /// Patch a resource through Cloud Control and wait for it
    Update {
        #[arg(long)]
        type_name: String,

        /// Primary identifier of the resource
        #[arg(long)]
        identifier: String,

        /// JSON Patch operations as a JSON array, or @path to a JSON file
        #[arg(long)]
        patch: String,

        #[arg(long)]
        region: Option<String>,
    },
    /// Delete a resource through Cloud Control and wait for it
    Delete {
        #[arg(long)]
        type_name: String,

        #[arg(long)]
        identifier: String,

        #[arg(long)]
        region: Option<String>,
    },
    /// Run a command repeatedly and treat its output as the state
    Exec {
        /// States meaning success (comma separated)
        #[arg(long, value_delimiter = ',', required = true)]
        target: Vec<String>,

        /// States meaning still in progress (comma separated)
        #[arg(long, value_delimiter = ',')]
        pending: Vec<String>,

        /// States meaning failure (comma separated)
        #[arg(long, value_delimiter = ',', default_value = "Failed")]
        failure: Vec<String>,

        /// Keep polling when the command exits non-zero
        #[arg(long)]
        retry_errors: bool,

        /// Command to run, after `--`
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let result = match cli.command {
        Commands::Request { token, region } => {
            let provider = provider(region.as_deref(), cli.interval, cli.timeout, &cancel).await;
            run_request(&provider, &token).await
        }
        Commands::Create {
            type_name,
            desired_state,
            region,
        } => match read_document(&desired_state) {
            Ok(desired_state) => {
                let provider =
                    provider(region.as_deref(), cli.interval, cli.timeout, &cancel).await;
                Ok(Report::from_operation(
                    provider
                        .cc_create_resource(&type_name, desired_state)
                        .await
                        .map(Some),
                ))
            }
            Err(e) => Err(e),
        },
        Commands::Update {
            type_name,
            identifier,
            patch,
            region,
        } => match read_patch(&patch) {
            Ok(patch_ops) => {
                let provider =
                    provider(region.as_deref(), cli.interval, cli.timeout, &cancel).await;
                Ok(Report::from_operation(
                    provider
                        .cc_update_resource(&type_name, &identifier, patch_ops)
                        .await
                        .map(|_| Some(identifier)),
                ))
            }
            Err(e) => Err(e),
        },
        Commands::Delete {
            type_name,
            identifier,
            region,
        } => {
            let provider = provider(region.as_deref(), cli.interval, cli.timeout, &cancel).await;
            Ok(Report::from_operation(
                provider
                    .cc_delete_resource(&type_name, &identifier)
                    .await
                    .map(|_| Some(identifier)),
            ))
        }
        Commands::Exec {
            target,
            pending,
            failure,
            retry_errors,
            command,
        } => {
            let policy = if retry_errors {
                ProbeErrorPolicy::RetryUntilTimeout
            } else {
                ProbeErrorPolicy::FailFast
            };
            let config = PollConfig::new(pending, target)
                .with_failure_states(failure)
                .with_min_interval(cli.interval)
                .with_timeout(cli.timeout)
                .with_probe_error_policy(policy);
            let result = exec::wait_for_command(&config, &cancel, &command).await;
            Ok(Report::from_poll(result, |out| (Some(out.clone()), None)))
        }
    };

    match result {
        Ok(report) => {
            report.print(cli.output);
            std::process::exit(report.exit_code());
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(report::exit_code(settle_core::PollOutcome::Errored));
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Interrupted, stopping...".yellow());
            cancel.cancel();
        }
    });
}

async fn provider(
    region: Option<&str>,
    interval: Duration,
    timeout: Duration,
    cancel: &CancellationToken,
) -> AwsccProvider {
    AwsccProvider::new(region)
        .await
        .with_poll_interval(interval)
        .with_timeout(timeout)
        .with_cancellation(cancel.clone())
}

async fn run_request(provider: &AwsccProvider, token: &str) -> Result<Report, String> {
    let result = provider.wait_for_request(token).await;
    Ok(Report::from_poll(result, |progress| {
        (
            progress.operation_status().map(|s| s.as_str().to_string()),
            progress.identifier().map(|id| id.to_string()),
        )
    }))
}

/// Parse a duration such as `500ms`, `30s`, `10m`, `1h` (bare numbers are seconds)
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let value: u64 = number
        .parse()
        .map_err(|_| format!("Invalid duration: {:?}", s))?;

    let secs = |factor: u64| {
        value
            .checked_mul(factor)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("Duration too large: {:?}", s))
    };

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "" | "s" => secs(1),
        "m" => secs(60),
        "h" => secs(3600),
        _ => Err(format!("Unknown duration unit {:?} in {:?}", unit, s)),
    }
}

/// Read a JSON document given inline or as `@path`
fn read_document(arg: &str) -> Result<Value, String> {
    let content = match arg.strip_prefix('@') {
        Some(path) => {
            fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))?
        }
        None => arg.to_string(),
    };
    serde_json::from_str(&content).map_err(|e| format!("Invalid JSON: {}", e))
}

fn read_patch(arg: &str) -> Result<Vec<Value>, String> {
    match read_document(arg)? {
        Value::Array(ops) => Ok(ops),
        _ => Err("Patch must be a JSON array of operations".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_duration("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_duration("45"), Ok(Duration::from_secs(45)));
        assert_eq!(parse_duration("10m"), Ok(Duration::from_secs(600)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
        assert!(parse_duration("10d").is_err());
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert!(parse_duration("18446744073709551615h").is_err());
        assert!(parse_duration("18446744073709551615m").is_err());
        assert_eq!(
            parse_duration("18446744073709551615s"),
            Ok(Duration::from_secs(u64::MAX))
        );
        assert!(parse_duration("99999999999999999999s").is_err());
    }

    #[test]
    fn test_read_document_inline_and_file() {
        let inline = read_document(r#"{"CidrBlock": "10.0.0.0/16"}"#).unwrap();
        assert_eq!(inline["CidrBlock"], "10.0.0.0/16");

        let dir = tempdir().unwrap();
        let path = dir.path().join("vpc.json");
        fs::write(&path, r#"{"CidrBlock": "10.1.0.0/16"}"#).unwrap();
        let from_file = read_document(&format!("@{}", path.display())).unwrap();
        assert_eq!(from_file["CidrBlock"], "10.1.0.0/16");

        assert!(read_document("@/nonexistent/settle.json").is_err());
        assert!(read_document("{not json").is_err());
    }

    #[test]
    fn test_read_patch_requires_array() {
        let ops =
            read_patch(r#"[{"op": "replace", "path": "/EnableDnsHostnames", "value": true}]"#)
                .unwrap();
        assert_eq!(ops.len(), 1);
        assert!(read_patch(r#"{"op": "replace"}"#).is_err());
    }

    #[test]
    fn test_cli_parses_exec() {
        let cli = Cli::try_parse_from([
            "settle",
            "--interval",
            "2s",
            "exec",
            "--target",
            "Succeeded",
            "--pending",
            "Accepted,Running",
            "--",
            "sh",
            "-c",
            "echo Succeeded",
        ])
        .unwrap();

        assert_eq!(cli.interval, Duration::from_secs(2));
        assert_eq!(cli.timeout, Duration::from_secs(600));
        match cli.command {
            Commands::Exec {
                target,
                pending,
                failure,
                retry_errors,
                command,
            } => {
                assert_eq!(target, vec!["Succeeded"]);
                assert_eq!(pending, vec!["Accepted", "Running"]);
                assert_eq!(failure, vec!["Failed"]);
                assert!(!retry_errors);
                assert_eq!(command, vec!["sh", "-c", "echo Succeeded"]);
            }
            _ => panic!("expected exec command"),
        }
    }

    #[test]
    fn test_cli_parses_request() {
        let cli = Cli::try_parse_from([
            "settle",
            "request",
            "abc-123",
            "--region",
            "us-east-1",
            "--output",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Commands::Request { ref token, region: Some(ref r) } if token == "abc-123" && r == "us-east-1"
        ));
    }

    #[test]
    fn test_cli_rejects_bad_duration() {
        let result = Cli::try_parse_from(["settle", "--timeout", "forever", "request", "t"]);
        assert!(result.is_err());
    }
}
