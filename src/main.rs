//! valuebench - Application Entry Point

use std::io::Write;

use anyhow::{Context, bail};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use valuebench::{
    Config,
    benchmark::{
        ArraySize, BenchmarkDriver, ExecutableNaming, ProcessLauncher, ReportSink, RunSummary,
        Variant, executable_name,
    },
    cli::{Cli, Command},
    utils::{format_elapsed, span},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env()?;
    cli.overrides.apply(&mut config);
    config.validate()?;

    // Initialize tracing on stderr; stdout carries the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.output.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::Plan => plan(&config),
        Command::Catalog => catalog(),
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let report = match &config.output.report_path {
        Some(path) => ReportSink::append_to(path)
            .with_context(|| format!("Failed to open report file {}", path.display()))?,
        None => ReportSink::stdout(),
    };
    let launcher = ProcessLauncher::new(report.try_clone()?)
        .merge_stderr(config.output.stderr_to_report());

    let seed = config.driver.seed.unwrap_or_else(|| rand::rng().random());

    info!(
        variants = %join_labels(&config.matrix.variants),
        array_sizes = %join_labels(&config.matrix.array_sizes),
        timeout_secs = config.driver.timeout_secs,
        max_iterations = config.driver.max_iterations,
        bin_dir = %config.output.bin_dir.display(),
        seed,
        "Starting benchmark run"
    );

    let mut driver = BenchmarkDriver::new(
        launcher,
        ExecutableNaming::new(&config.output.bin_dir),
        report,
        StdRng::seed_from_u64(seed),
        config.settings(),
    );

    let outcome = tokio::select! {
        result = driver.run(
            &config.matrix.array_sizes,
            &config.matrix.variants,
            &config.driver.step,
        ) => Some(result),
        _ = shutdown_signal() => None,
    };

    driver.report_mut().flush()?;

    let summary = match outcome {
        Some(result) => result?,
        None => {
            warn!("Shutdown signal received, benchmark run interrupted");
            return Ok(());
        }
    };

    log_summary(&summary);

    if let Some(path) = &config.output.summary_json {
        std::fs::write(path, summary.to_json()?)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        info!("Summary written to {}", path.display());
    }

    Ok(())
}

/// Print every executable of the configured matrix and whether it exists
fn plan(config: &Config) -> anyhow::Result<()> {
    let naming = ExecutableNaming::new(&config.output.bin_dir);
    let mut stdout = std::io::stdout().lock();
    let mut missing = 0usize;

    for array_size in &config.matrix.array_sizes {
        for variant in &config.matrix.variants {
            let path = naming.path_for(variant, *array_size);
            let present = path.is_file();
            if !present {
                missing += 1;
            }
            writeln!(
                stdout,
                "{}\t{}",
                path.display(),
                if present { "present" } else { "missing" }
            )?;
        }
    }
    stdout.flush()?;

    if missing > 0 {
        bail!("{} executable(s) missing from {}", missing, naming.bin_dir().display());
    }
    Ok(())
}

/// Print the name of every performance executable the build produces
fn catalog() -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    for variant in Variant::catalog() {
        for array_size in ArraySize::catalog() {
            writeln!(stdout, "{}", executable_name(&variant, array_size))?;
        }
    }
    stdout.flush()?;
    Ok(())
}

fn log_summary(summary: &RunSummary) {
    for class in &summary.classes {
        for (variant, stats) in &class.variants {
            info!(
                array_size = %class.array_size,
                variant = %variant,
                invocations = stats.invocations,
                min = %format_elapsed(std::time::Duration::from_secs_f64(stats.time_min_secs)),
                avg = %format_elapsed(std::time::Duration::from_secs_f64(stats.time_avg_secs)),
                max = %format_elapsed(std::time::Duration::from_secs_f64(stats.time_max_secs)),
                failed_exits = stats.failed_exits,
                retired_at = ?stats.retired_at,
                "Variant summary"
            );
        }
    }

    let elapsed = summary
        .finished_at
        .map(|finished| format_elapsed(span(summary.started_at, finished)))
        .unwrap_or_default();
    info!(
        classes = summary.classes.len(),
        invocations = summary.invocations(),
        elapsed = %elapsed,
        "Benchmark run complete"
    );
}

fn join_labels<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Resolves when Ctrl+C or SIGTERM arrives
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
