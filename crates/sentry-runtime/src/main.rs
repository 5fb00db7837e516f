//! # NACL-Sentry
//!
//! Handles one finding event against a local sandbox.
//!
//! ## Startup Sequence
//!
//! 1. Parse arguments, initialize logging
//! 2. Load configuration from the environment
//! 3. Load the sandbox and wire the container
//! 4. Handle the event
//! 5. Persist the sandbox (also after a failed reconciliation, so partial
//!    writes stay visible to the next run)

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use ns_telemetry::{gather_metrics, init_logging, register_metrics, TelemetryConfig};
use sentry_runtime::{HandlerOutcome, SentryConfig, SentryContainer};

/// NACL-Sentry: block hosts flagged by threat findings
#[derive(Parser, Debug)]
#[command(name = "sentry-runtime")]
#[command(about = "Rotate flagged hosts through a reserved range of deny rules")]
struct Args {
    /// Finding event JSON file, or `-` for stdin
    #[arg(short, long, default_value = "-")]
    event: String,

    /// Sandbox JSON file holding rule lists, state tables and IP sets
    #[arg(short, long, default_value = "sandbox.json")]
    sandbox: PathBuf,

    /// Force JSON log output
    #[arg(long)]
    json_logs: bool,

    /// Print Prometheus metrics to stdout before exiting
    #[arg(long)]
    dump_metrics: bool,
}

fn read_event(source: &str) -> Result<String> {
    if source == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read event from stdin")?;
        Ok(raw)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read event {source}"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut telemetry = TelemetryConfig::from_env();
    telemetry.json_logs |= args.json_logs;
    init_logging(&telemetry)?;
    register_metrics()?;

    let config = SentryConfig::from_env().context("Failed to load configuration")?;
    let container = SentryContainer::open(config, &args.sandbox)?;

    let raw = read_event(&args.event)?;
    let result = container.handler.handle_raw(&raw).await;

    container
        .persist()
        .context("Failed to persist sandbox")?;

    if args.dump_metrics {
        print!("{}", gather_metrics()?);
    }

    match result {
        Ok(HandlerOutcome::Skipped { context }) => {
            info!(boundary_ref = %context.boundary_ref, "Finding skipped");
            Ok(())
        }
        Ok(HandlerOutcome::Blocked { report, .. }) => {
            info!(
                resource_id = %report.resource_id,
                host_ip = %report.host_ip,
                outcome = report.outcome.as_str(),
                "Finding processed"
            );
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "Finding processing failed");
            Err(err.into())
        }
    }
}
