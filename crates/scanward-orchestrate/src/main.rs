//! CLI entry point for the scanward security scan orchestrator.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use scanward_core::config::{duration, load_section};
use scanward_core::{ApiKey, Severity};
use scanward_orchestrate::{cancel_pair, RunOutcome, ScanConfig, ScanOrchestrator};
use scanward_zap::ZapClient;

#[derive(Parser, Debug)]
#[command(name = "scanward")]
#[command(about = "Run an OWASP ZAP active scan against a target and summarize the findings")]
struct Cli {
    /// URL of the system under test.
    #[arg(short, long, env = "BASE_URL")]
    target: Option<String>,

    /// Base URL of the ZAP control API.
    #[arg(short, long, env = "ZAP_API_URL")]
    engine_url: Option<String>,

    /// ZAP API key.
    #[arg(long, env = "ZAP_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Passive scan grace period (e.g. 5s).
    #[arg(long, value_parser = duration::parse)]
    passive_wait: Option<Duration>,

    /// Delay between status checks (e.g. 2s).
    #[arg(long, value_parser = duration::parse)]
    poll_interval: Option<Duration>,

    /// Give up if the active scan has not finished after this long (e.g. 30m).
    #[arg(long, value_parser = duration::parse)]
    poll_timeout: Option<Duration>,

    /// Give up after this many status checks.
    #[arg(long)]
    max_polls: Option<u32>,

    /// Timeout for each request to ZAP (e.g. 30s).
    #[arg(long, value_parser = duration::parse)]
    request_timeout: Option<Duration>,

    /// Minimum severity listed in the summary: informational, low, medium, high.
    #[arg(long)]
    notable: Option<Severity>,

    /// Exit non-zero if any alert is at or above this severity.
    #[arg(long)]
    fail_on: Option<Severity>,

    /// Characters of each alert description shown in the summary.
    #[arg(long)]
    description_limit: Option<usize>,

    /// Where to write the HTML report.
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Print the summary as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,

    /// Config file prefix (default: scanward).
    #[arg(short, long, default_value = "scanward")]
    config: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            eprintln!("Security scan failed: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let engine = match ZapClient::new(&config.zap_config()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Security scan failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (handle, token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling scan");
            handle.cancel();
        }
    });

    let outcome = ScanOrchestrator::new(engine, config, token).run().await;
    print_outcome(&outcome, cli.json);
    ExitCode::from(outcome.exit_status())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn resolve_config(cli: &Cli) -> anyhow::Result<ScanConfig> {
    let mut config: ScanConfig = load_section(&cli.config, "SCANWARD", "scan")
        .with_context(|| format!("failed to load configuration '{}'", cli.config))?;
    apply_overrides(&mut config, cli);
    config.validate()?;
    Ok(config)
}

fn apply_overrides(config: &mut ScanConfig, cli: &Cli) {
    if let Some(target) = &cli.target {
        config.target_url = target.clone();
    }
    if let Some(engine_url) = &cli.engine_url {
        config.engine_url = engine_url.clone();
    }
    if let Some(key) = &cli.api_key {
        config.api_key = ApiKey::new(key.as_str());
    }
    if let Some(wait) = cli.passive_wait {
        config.passive_wait = wait;
    }
    if let Some(interval) = cli.poll_interval {
        config.poll_interval = interval;
    }
    if let Some(timeout) = cli.poll_timeout {
        config.poll_timeout = timeout;
    }
    if cli.max_polls.is_some() {
        config.max_polls = cli.max_polls;
    }
    if let Some(timeout) = cli.request_timeout {
        config.request_timeout = timeout;
    }
    if let Some(notable) = cli.notable {
        config.notable_threshold = notable;
    }
    if cli.fail_on.is_some() {
        config.fail_on = cli.fail_on;
    }
    if let Some(limit) = cli.description_limit {
        config.description_limit = limit;
    }
    if let Some(report) = &cli.report {
        config.report_path = report.clone();
    }
}

fn print_outcome(outcome: &RunOutcome, json: bool) {
    if let Some(summary) = outcome.summary() {
        if json {
            match serde_json::to_string_pretty(summary) {
                Ok(text) => println!("{text}"),
                Err(e) => tracing::error!(error = %e, "Failed to serialize summary"),
            }
        } else {
            println!("{summary}");
        }
    }

    if let RunOutcome::Failed { phase, error, .. } = outcome {
        eprintln!("Security scan failed during {phase}: {error}");
    }
}
