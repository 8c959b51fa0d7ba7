use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Parser;
use code_runner::{SystemExecutor, Toolchain};
use grader::progress::{ProgressMessage, spawn_delivery, submission_topic};
use grader::{Grader, GradingContext, GradingLimiter, Phase, RubricConfig};
use marker::late::days_late;
use marker::report::RubricResultResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing_appender::rolling;
use util::config;
use util::execution_config::ExecutionLimits;
use util::ws::WebSocketManager;

/// Grade a student checkout against a phase's pass-off tests.
#[derive(Debug, Parser)]
#[command(name = "grader", version)]
struct Args {
    /// Submitter id; progress is published on `submissions/<net-id>`.
    #[arg(long)]
    net_id: String,

    /// Phase to grade, e.g. `3` or `phase3`.
    #[arg(long)]
    phase: Phase,

    /// Path to the student's checkout.
    #[arg(long)]
    repo: PathBuf,

    /// Whole days the submission is late.
    #[arg(long, default_value_t = 0, conflicts_with = "due")]
    days_late: u32,

    /// Due date (RFC 3339); with --submitted, lateness is computed from the two.
    #[arg(long, requires = "submitted")]
    due: Option<DateTime<Utc>>,

    /// Submission time (RFC 3339).
    #[arg(long, requires = "due")]
    submitted: Option<DateTime<Utc>>,

    /// Rubric file; defaults to RUBRIC_CONFIG_PATH.
    #[arg(long)]
    rubric: Option<PathBuf>,

    /// JSON file overriding the build/compile/test timeouts.
    #[arg(long)]
    limits: Option<PathBuf>,

    /// Keep the stage directory for inspection.
    #[arg(long)]
    keep_stage: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _log_guard = init_logging(&config::log_file(), &config::log_level());

    tracing::info!(
        "Starting {} in {} mode",
        config::project_name(),
        config::env()
    );

    let rubric_path = args
        .rubric
        .clone()
        .unwrap_or_else(|| PathBuf::from(config::rubric_config_path()));
    let rubric = match RubricConfig::load(&rubric_path) {
        Ok(rubric) => rubric,
        Err(e) => {
            tracing::error!(error = %e, "could not load rubric");
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let extra_credit = match rubric.item(args.phase) {
        Ok(item) => item.extra_credit_policy(),
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let lateness = match (args.due, args.submitted) {
        (Some(due), Some(submitted)) => days_late(due, submitted),
        _ => args.days_late,
    };

    let ws = WebSocketManager::new();
    let mut listener = ws.subscribe(&submission_topic(&args.net_id)).await;
    let printer = tokio::spawn(async move {
        loop {
            let raw = match listener.recv().await {
                Ok(raw) => raw,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            };
            match serde_json::from_str::<ProgressMessage>(&raw) {
                Ok(ProgressMessage::Update { message }) => eprintln!("  {message}"),
                Ok(ProgressMessage::Error { message }) => eprintln!("! {message}"),
                Err(_) => eprintln!("  {raw}"),
            }
        }
    });

    let (sink, delivery) = spawn_delivery(ws.clone(), &args.net_id);

    let ctx = match GradingContext::builder(args.net_id.clone(), args.phase)
        .repo_path(args.repo.clone())
        .extra_credit(extra_credit)
        .days_late(lateness)
        .progress(sink)
        .build()
    {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut toolchain = Toolchain::from_config();
    if let Some(path) = &args.limits {
        match ExecutionLimits::load(path) {
            Ok(limits) => toolchain = toolchain.with_limits(limits),
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let grader = Grader::new(
        Arc::new(SystemExecutor),
        toolchain,
        rubric,
        GradingLimiter::new(config::max_concurrent_gradings()),
    )
    .keep_stage(args.keep_stage);

    let result = grader.grade(&ctx).await;

    // Dropping the last sink and manager ends delivery and then the printer.
    drop(ctx);
    let _ = delivery.await;
    drop(ws);
    let _ = printer.await;

    let scored = result.was_scored();
    match serde_json::to_string_pretty(&RubricResultResponse::from(result)) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!(error = %e, "could not serialize result");
            return ExitCode::FAILURE;
        }
    }

    if scored {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn init_logging(log_file: &str, log_level: &str) -> tracing_appender::non_blocking::WorkerGuard {
    use std::fs;
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    fs::create_dir_all("logs").ok();

    let file_appender = rolling::daily("logs", log_file);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    let log_to_stdout = config::log_to_stdout();

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(true)
        .with_thread_ids(true);

    let env_filter =
        EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if log_to_stdout {
        registry.with(stdout_layer).init();
    } else {
        registry.init();
    }

    guard
}
