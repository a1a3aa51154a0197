//! CLI binary for the trajlab staged pipeline launcher.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use trajlab_pipeline::{
    ConsolePrompter, PipelineConfig, PipelineOrchestrator, PipelineOutcome, PipelineReport,
};
use trajlab_proc::LocalProcessRunner;
use trajlab_types::ExecStatus;

#[derive(Parser)]
#[command(
    name = "trajlab",
    version,
    about = "Staged launcher for the trajectory prediction toolkit"
)]
struct Cli {
    /// Project root containing the scripts/, app/ and dashboard/ entrypoints
    /// (default: current directory)
    #[arg(short, long)]
    workdir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let root = match cli.workdir {
        Some(dir) => std::fs::canonicalize(dir)?,
        None => std::env::current_dir()?,
    };

    print_header(&root);

    let config = PipelineConfig::standard(&root);
    let runner = Arc::new(LocalProcessRunner::new(&root, config.log_dir.clone()));
    let prompter = Arc::new(ConsolePrompter);

    let report = PipelineOrchestrator::new(config, runner, prompter)
        .run()
        .await?;

    print_summary(&report);
    std::process::exit(report.exit_code());
}

fn print_header(root: &std::path::Path) {
    println!("{}", "=".repeat(80));
    println!("TRAJECTORY PREDICTION LAB");
    println!("{}", "=".repeat(80));
    println!("Staged pipeline: data generation -> training -> validation -> launch");
    println!("Project root: {}", root.display());
    println!("{}", "=".repeat(80));
}

fn print_summary(report: &PipelineReport) {
    println!("\n{}", "=".repeat(80));
    match &report.outcome {
        PipelineOutcome::Completed { processing_skipped } => {
            println!("PIPELINE COMPLETE");
            println!("{}", "=".repeat(80));
            if *processing_skipped {
                println!("Processing stages: skipped (existing models and data reused)");
            } else {
                for record in &report.stage_results {
                    println!(
                        "  {:<10} {:<9} ({} ms)",
                        record.stage,
                        status_label(&record.result.status),
                        record.result.duration.as_millis()
                    );
                }
            }

            if report.launches.is_empty() {
                println!("Applications: none launched");
            } else {
                println!("Applications:");
                for launch in &report.launches {
                    if launch.spawn_succeeded {
                        let handle = launch.handle.as_ref();
                        let pid = handle
                            .and_then(|h| h.pid)
                            .map(|p| p.to_string())
                            .unwrap_or_else(|| "?".into());
                        let log = handle
                            .and_then(|h| h.log_path.as_ref())
                            .map(|p| p.display().to_string())
                            .unwrap_or_else(|| "-".into());
                        println!("  {:<14} pid {:<8} log {}", launch.app, pid, log);
                    } else {
                        println!(
                            "  {:<14} FAILED: {}",
                            launch.app,
                            launch.error.as_deref().unwrap_or("unknown error")
                        );
                    }
                }
                println!();
                println!("Access points:");
                println!("  Web Simulator:       http://localhost:8501");
                println!("  Analytics Dashboard: http://localhost:8502");
            }
        }
        PipelineOutcome::Aborted { reason } => {
            println!("PIPELINE ABORTED");
            println!("{}", "=".repeat(80));
            println!("{}", reason);
        }
    }
    println!("{}", "=".repeat(80));
}

fn status_label(status: &ExecStatus) -> &'static str {
    match status {
        ExecStatus::Success => "ok",
        ExecStatus::Failure { .. } => "failed",
        ExecStatus::TimedOut => "timed out",
    }
}
