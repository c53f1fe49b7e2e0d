//! gridbench command-line interface
//!
//! Wires configuration, discovery, the mode catalog, and the execution
//! matrix together behind a clap-based CLI with `run` and `list`
//! subcommands.

pub mod config;
pub mod discovery;
pub mod matrix;
pub mod modes;

use crate::config::{GridConfig, ResolvedConfig};
use crate::matrix::ExecutionMatrix;
use crate::modes::{Mode, RunContext};
use anyhow::Context;
use clap::{Parser, Subcommand};
use gridbench_core::sample;
use gridbench_exec::{ArtifactCache, ProcessRegistry, Shutdown, Supervisor};
use gridbench_report::{render_matrix, CellState, MatrixSummary};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "gridbench", version, about = "Benchmark execution harness")]
struct Cli {
    /// Benchmark root directory (one subdirectory per benchmark).
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Explicit config file (default: discover gridbench.toml upward).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full (benchmark x mode) matrix.
    Run {
        /// Regex restricting which benchmarks run.
        filter: Option<String>,

        /// Thread count handed to the native-mt binaries.
        #[arg(long)]
        threads: Option<u32>,

        /// Untimed warmup invocations per cell.
        #[arg(long)]
        warmup: Option<u32>,

        /// Minimum timed trials per cell.
        #[arg(long)]
        min_runs: Option<u32>,

        /// Hard ceiling on timed trials per cell.
        #[arg(long)]
        max_runs: Option<u32>,

        /// Minimum cumulative measured seconds per cell.
        #[arg(long)]
        min_total_seconds: Option<f64>,

        /// Per-command timeout (e.g. "60s", "5m").
        #[arg(long)]
        timeout: Option<String>,
    },
    /// List discovered benchmarks and their available inputs.
    List {
        /// Regex restricting which benchmarks are listed.
        filter: Option<String>,
    },
}

/// CLI entry point. Parses arguments, layers configuration, and drives the
/// selected subcommand on a current-thread tokio runtime.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let code = runtime.block_on(dispatch(cli))?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let mut config = match &cli.config {
        Some(path) => GridConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => GridConfig::discover().unwrap_or_default(),
    };
    config.apply_env();

    match cli.command {
        Command::List { filter } => {
            let filter = compile_filter(filter.as_deref())?;
            let rows = discovery::discover_rows(&cli.root, filter.as_ref())?;
            for row in &rows {
                let mut inputs = Vec::new();
                if row.native_source.is_some() {
                    inputs.push("native.c");
                }
                if row.runtime_source.is_some() {
                    inputs.push("runtime.py");
                }
                println!("{}  [{}]", row.name, inputs.join(", "));
            }
            Ok(0)
        }
        Command::Run {
            filter,
            threads,
            warmup,
            min_runs,
            max_runs,
            min_total_seconds,
            timeout,
        } => {
            apply_cli_overrides(
                &mut config,
                warmup,
                min_runs,
                max_runs,
                min_total_seconds,
                timeout.as_deref(),
            );
            let resolved = config.validate()?;

            let filter = compile_filter(filter.as_deref())?;
            let rows = discovery::discover_rows(&cli.root, filter.as_ref())?;
            if rows.is_empty() {
                anyhow::bail!("no benchmarks found under {}", cli.root.display());
            }

            let threads = threads.unwrap_or_else(default_threads);
            run_matrix(rows, Mode::catalog(threads), &resolved, cli.verbose).await
        }
    }
}

fn compile_filter(pattern: Option<&str>) -> anyhow::Result<Option<Regex>> {
    pattern
        .map(|p| Regex::new(p).with_context(|| format!("invalid benchmark filter: {p}")))
        .transpose()
}

fn default_threads() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

fn apply_cli_overrides(
    config: &mut GridConfig,
    warmup: Option<u32>,
    min_runs: Option<u32>,
    max_runs: Option<u32>,
    min_total_seconds: Option<f64>,
    timeout: Option<&str>,
) {
    if let Some(warmup) = warmup {
        config.sampling.warmup = warmup;
    }
    if let Some(min_runs) = min_runs {
        config.sampling.min_runs = min_runs;
    }
    if let Some(max_runs) = max_runs {
        config.sampling.max_runs = max_runs;
    }
    if let Some(min_total_seconds) = min_total_seconds {
        config.sampling.min_total_seconds = min_total_seconds;
    }
    if let Some(timeout) = timeout {
        config.supervisor.timeout = timeout.to_string();
    }
}

async fn run_matrix(
    rows: Vec<discovery::BenchmarkRow>,
    modes: Vec<Mode>,
    resolved: &ResolvedConfig,
    verbose: bool,
) -> anyhow::Result<i32> {
    let registry = Arc::new(ProcessRegistry::new());
    let shutdown = Shutdown::new(Arc::clone(&registry));
    shutdown.install();

    let scratch = tempfile::Builder::new()
        .prefix("gridbench-")
        .tempdir()
        .context("failed to create scratch directory")?;
    shutdown.set_scratch_dir(scratch.path().to_path_buf());

    let supervisor =
        Supervisor::new(Arc::clone(&registry)).with_output_limit(resolved.max_output_bytes);
    let cache = ArtifactCache::new();
    let cx = RunContext {
        supervisor: &supervisor,
        cache: &cache,
        scratch_dir: scratch.path(),
        timeout: resolved.timeout,
        cc: &resolved.cc,
        runtime: &resolved.runtime,
    };

    let mut matrix = ExecutionMatrix::new(rows, modes);

    let progress = ProgressBar::new(matrix.applicable_cells() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:30} {pos}/{len} cells {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let sampling = resolved.sampling;
    let summary = matrix
        .run(
            |row, mode| {
                let cx = &cx;
                async move {
                    tracing::debug!(benchmark = %row.name, mode = %mode.label, "sampling");
                    sample(&sampling, || mode.run_once(&row, cx)).await
                }
            },
            |m| {
                refresh_progress(&progress, m);
                if verbose {
                    // Reprint the whole grid after every cell transition.
                    progress.suspend(|| {
                        print!(
                            "{}",
                            render_matrix(&m.row_names(), &m.mode_labels(), m.cells())
                        );
                    });
                }
            },
        )
        .await;

    progress.finish_and_clear();
    print!(
        "{}",
        render_matrix(&matrix.row_names(), &matrix.mode_labels(), matrix.cells())
    );

    Ok(summary.exit_code())
}

fn refresh_progress(progress: &ProgressBar, matrix: &ExecutionMatrix) {
    let summary = MatrixSummary::from_cells(matrix.cells().iter().flatten());
    progress.set_position((summary.done + summary.errors + summary.timeouts) as u64);

    let rows = matrix.row_names();
    let modes = matrix.mode_labels();
    for (row, row_cells) in rows.iter().zip(matrix.cells()) {
        for (mode, cell) in modes.iter().zip(row_cells) {
            if matches!(cell, CellState::Running) {
                progress.set_message(format!("{row}/{mode}"));
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_overrides_layer_on_top_of_file() {
        let mut config: GridConfig = toml::from_str(
            r#"
            [sampling]
            min_runs = 5
        "#,
        )
        .unwrap();

        apply_cli_overrides(&mut config, None, None, Some(30), Some(2.0), Some("90s"));

        assert_eq!(config.sampling.min_runs, 5); // from file, untouched
        assert_eq!(config.sampling.max_runs, 30);
        assert_eq!(config.sampling.min_total_seconds, 2.0);
        assert_eq!(
            config::parse_duration(&config.supervisor.timeout).unwrap(),
            std::time::Duration::from_secs(90)
        );
    }
}
