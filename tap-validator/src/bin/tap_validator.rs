//! TAP Validator command line.
//!
//! Validates that a TAP service is operating as expected, or compares two TAP
//! services that serve the same dataset.
//!
//! Exit status: 0 when every validation succeeded, 1 when any did not, 2 on
//! usage or configuration errors.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

use tap_validator::logging::setup::{init_logging, LoggingConfig};
use tap_validator::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run mode: TABLE_VALIDATION, VALIDATION or COMPARISON
    #[arg(long)]
    mode: String,

    /// URL of the TAP service to validate
    #[arg(long = "tap-service", alias = "tap_service")]
    tap_service: String,

    /// URL of the second TAP service, for COMPARISON runs
    #[arg(long = "secondary-tap-service", alias = "secondary_tap_service")]
    secondary_tap_service: Option<String>,

    /// Slack webhook to notify; implies SLACK notifications
    #[arg(long = "slack-webhook", alias = "slack_webhook")]
    slack_webhook: Option<String>,

    /// File with one query per line, for COMPARISON runs
    #[arg(long)]
    queries: Option<PathBuf>,

    /// Notification channel: LOG, SLACK or EMAIL
    #[arg(
        long = "notification-method",
        alias = "notification_method",
        default_value = "LOG"
    )]
    notification_method: AlertStrategy,

    /// Probe every table instead of one random table per schema
    #[arg(long)]
    fullscan: bool,

    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report format: human or json
    #[arg(long, default_value = "human")]
    format: OutputFormat,

    /// Log JSON lines instead of plain text
    #[arg(long)]
    log_json: bool,

    /// Log debug output from the validator
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let logging = if args.verbose {
        LoggingConfig::development()
    } else {
        LoggingConfig::default()
    };
    if let Err(e) = init_logging(logging.with_json_format(args.log_json)) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!(error = %e, "Validation run aborted");
            eprintln!("Error: {e:#}");
            let usage = e
                .downcast_ref::<TapError>()
                .is_some_and(TapError::is_usage_error);
            ExitCode::from(if usage { 2 } else { 1 })
        }
    }
}

/// Runs the requested validation. Returns whether every result succeeded.
async fn run(args: Args) -> Result<bool> {
    let mode: RunMode = args.mode.parse()?;

    let settings = match &args.config {
        Some(path) => ValidatorConfig::from_file(path)?,
        None => ValidatorConfig::new(),
    };
    settings.validate()?;
    let settings = Arc::new(settings);

    let transport = Arc::new(HttpTransport::new(settings.http_timeout())?);
    let service = Arc::new(TapService::new(args.tap_service));

    let webhook = args.slack_webhook.filter(|url| !url.is_empty());
    let strategy = if webhook.is_some() {
        AlertStrategy::Slack
    } else {
        args.notification_method
    };
    let alerter = strategy.alerter(&settings)?;

    let mut config = ValidationConfiguration::new(Arc::clone(&service))
        .with_alerter(alerter, webhook.unwrap_or_default());
    if let Some(url) = args.secondary_tap_service.filter(|url| !url.is_empty()) {
        config = config.with_second_service(Arc::new(TapService::new(url)));
    }
    if let Some(path) = args.queries {
        config = config.with_queries(path);
    }

    let validator = TapValidator::new(config, settings, transport);
    let results = validator
        .run(mode, args.fullscan)
        .await
        .with_context(|| format!("{mode} run against {service} failed"))?;

    let formatter = args.format.formatter();
    for result in &results {
        println!("{}", formatter.format(&service, result)?);
    }
    Ok(results.iter().all(ValidationResult::is_success))
}
