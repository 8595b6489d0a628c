#![deny(unsafe_code)]

mod exit_code;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sharewatch_core::{
    AutofsMapReader, DesktopNotifier, ListError, MonitorConfig, ReconcileError, Reconciler,
    RunGuard, RunOutcome, SmbclientLister,
};

/// Monitor drift between configured and NAS-advertised SMB shares
#[derive(Parser)]
#[command(name = "sharewatch")]
#[command(author, version)]
#[command(after_help = "EXAMPLES:
    # Run one reconciliation pass
    sharewatch

    # Override the NAS host and shrink the connectivity budget
    sharewatch --host tower --attempts 3

    # Use an alternative config file
    sharewatch --config /etc/sharewatch/config.toml

    # Machine-readable outcome for scripting
    sharewatch --json
")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Print the run outcome as JSON
    #[arg(long)]
    json: bool,

    /// Read configuration from this file instead of the platform config dir
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// NAS host to monitor (overrides the config file)
    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    /// Maximum connectivity probe attempts (overrides the config file)
    #[arg(long, value_name = "N")]
    attempts: Option<u32>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if !cli.quiet {
        setup_tracing(cli.verbose);
    }

    match run(&cli) {
        Ok(()) => ExitCode::from(exit_code::SUCCESS),
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e:#}");
            }
            ExitCode::from(categorize_error(&e))
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => MonitorConfig::load_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => MonitorConfig::load().context("Failed to load configuration")?,
    };
    if let Some(host) = &cli.host {
        config.host.clone_from(host);
    }
    if let Some(attempts) = cli.attempts {
        config.probe.max_attempts = attempts;
    }

    // The cache directory may have been deleted between runs; re-assert it
    // before taking the lock.
    std::fs::create_dir_all(&config.cache_dir).with_context(|| {
        format!("Failed to create cache dir: {}", config.cache_dir.display())
    })?;

    let Some(_guard) = RunGuard::acquire(&config.lock_path())
        .with_context(|| format!("Failed to open lock file: {}", config.lock_path().display()))?
    else {
        tracing::info!("another sharewatch run is in progress, exiting");
        if !cli.quiet && !cli.json {
            eprintln!("Another sharewatch run is in progress; nothing to do.");
        }
        return Ok(());
    };

    let lister = SmbclientLister::new(&config);
    let reader = AutofsMapReader::new(config.map_file());
    let sink = DesktopNotifier::new(config.notify_timeout_ms);

    let outcome = Reconciler::new(&config, &lister, &reader, &sink).run()?;

    if cli.json {
        print_json(&outcome)?;
    } else if !cli.quiet {
        print_summary(&outcome);
    }

    Ok(())
}

fn print_summary(outcome: &RunOutcome) {
    match outcome {
        RunOutcome::Clean => eprintln!("All configured shares match the NAS."),
        RunOutcome::MismatchReported(report) => {
            eprintln!("Share mismatch detected:");
            eprintln!("{}", sharewatch_core::render_mismatch(report));
        }
        RunOutcome::MismatchSuppressed(report) => {
            eprintln!("Share mismatch unchanged since last report (notification suppressed):");
            eprintln!("{}", sharewatch_core::render_mismatch(report));
        }
    }
}

fn print_json(outcome: &RunOutcome) -> Result<()> {
    let (kind, report) = match outcome {
        RunOutcome::Clean => ("clean", None),
        RunOutcome::MismatchReported(report) => ("mismatch-reported", Some(report)),
        RunOutcome::MismatchSuppressed(report) => ("mismatch-suppressed", Some(report)),
    };

    let names = |set: &sharewatch_core::ShareSet| {
        set.iter().map(|n| n.as_str().to_string()).collect::<Vec<_>>()
    };

    let output = match report {
        Some(report) => serde_json::json!({
            "outcome": kind,
            "missing_on_nas": names(&report.missing_on_nas),
            "extra_on_nas": names(&report.extra_on_nas),
        }),
        None => serde_json::json!({
            "outcome": kind,
            "missing_on_nas": [],
            "extra_on_nas": [],
        }),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Set up tracing/logging based on verbosity level
fn setup_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with_writer(io::stderr)
        .init();
}

/// Map an error chain to an exit code using typed downcasting rather than
/// message matching.
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(reconcile_err) = cause.downcast_ref::<ReconcileError>() {
            return match reconcile_err {
                ReconcileError::Unreachable { .. } => exit_code::UNREACHABLE,
                ReconcileError::List(_) => exit_code::LIST_FAILED,
                ReconcileError::NoSharesVisible { .. } => exit_code::NO_SHARES_VISIBLE,
            };
        }
        if cause.downcast_ref::<ListError>().is_some() {
            return exit_code::LIST_FAILED;
        }
    }

    exit_code::GENERAL_ERROR
}
