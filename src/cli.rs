use crate::dashboard::{DashboardQueryFacade, QueryLimits};
use crate::model::DashboardView;
use crate::stats::StatsFile;
use crate::storage::{self, OperationsFile, RecordsFile};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "extraction-dashboard",
    version,
    about = "Operator dashboard for extraction pipeline runs"
)]
pub struct Cli {
    /// Directory shared with the extraction pipeline (stats.json, records.jsonl, operations.jsonl)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Override the run statistics file
    #[arg(long)]
    pub stats_file: Option<PathBuf>,

    /// Override the extracted records file
    #[arg(long)]
    pub records_file: Option<PathBuf>,

    /// Override the operations log file
    #[arg(long)]
    pub operations_file: Option<PathBuf>,

    /// Number of recent extracted records to show
    #[arg(long, default_value = "10")]
    pub records_limit: NonZeroUsize,

    /// Number of recent operation log entries to show
    #[arg(long, default_value = "5")]
    pub logs_limit: NonZeroUsize,

    /// Print the dashboard as JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print a text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Print the category taxonomy as JSON and exit
    #[arg(long)]
    pub categories: bool,

    /// How often the TUI reloads the dashboard
    #[arg(long, default_value = "5s")]
    pub refresh_interval: humantime::Duration,

    /// Default log filter (RUST_LOG takes precedence)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Resolved file locations for one dashboard session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub data_dir: PathBuf,
    pub stats: PathBuf,
    pub records: PathBuf,
    pub operations: PathBuf,
    pub log: PathBuf,
}

impl Cli {
    pub fn interactive(&self) -> bool {
        !self.json && !self.text && !self.categories
    }

    pub fn limits(&self) -> QueryLimits {
        QueryLimits {
            records: self.records_limit,
            logs: self.logs_limit,
        }
    }

    pub fn data_paths(&self) -> Result<DataPaths> {
        let data_dir = match self.data_dir.clone() {
            Some(dir) => dir,
            None => storage::default_data_dir()?,
        };
        Ok(DataPaths {
            stats: self
                .stats_file
                .clone()
                .unwrap_or_else(|| data_dir.join(storage::STATS_FILE)),
            records: self
                .records_file
                .clone()
                .unwrap_or_else(|| data_dir.join(storage::RECORDS_FILE)),
            operations: self
                .operations_file
                .clone()
                .unwrap_or_else(|| data_dir.join(storage::OPERATIONS_FILE)),
            log: data_dir.join(storage::LOG_FILE),
            data_dir,
        })
    }
}

/// Wire the file-backed collaborators into a facade.
pub fn build_facade(args: &Cli, paths: &DataPaths) -> DashboardQueryFacade {
    DashboardQueryFacade::new(
        Arc::new(StatsFile::new(&paths.stats)),
        Arc::new(RecordsFile::records(&paths.records)),
        Arc::new(OperationsFile::operations(&paths.operations)),
        args.limits(),
    )
}

pub async fn run(args: Cli) -> Result<()> {
    if args.categories && (args.json || args.text) {
        return Err(anyhow::anyhow!(
            "--categories cannot be combined with --json or --text"
        ));
    }
    if args.json && args.text {
        return Err(anyhow::anyhow!("choose one of --json or --text"));
    }

    if args.categories {
        crate::logging::init(&args.log_level, None)?;
        return run_categories().await;
    }

    let paths = args.data_paths()?;

    if args.interactive() {
        #[cfg(feature = "tui")]
        {
            crate::logging::init(&args.log_level, Some(&paths.log))?;
            return crate::tui::run(args, paths).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            crate::logging::init(&args.log_level, None)?;
            return run_text(args, paths).await;
        }
    }

    crate::logging::init(&args.log_level, None)?;
    if args.json {
        return run_json(args, paths).await;
    }
    run_text(args, paths).await
}

async fn run_categories() -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();
    let out = serde_json::to_string_pretty(&crate::taxonomy::taxonomy())
        .context("serialize taxonomy")?;
    let _ = out_tx.send(OutputLine::Stdout(out));
    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

async fn run_json(args: Cli, paths: DataPaths) -> Result<()> {
    let facade = build_facade(&args, &paths);
    let (out_tx, out_handle) = spawn_output_writer();

    let view = facade.assemble().await;
    let out = serde_json::to_string_pretty(&view).context("serialize dashboard")?;
    let _ = out_tx.send(OutputLine::Stdout(out));
    report_degraded(&view, &out_tx);

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

async fn run_text(args: Cli, paths: DataPaths) -> Result<()> {
    let facade = build_facade(&args, &paths);
    let (out_tx, out_handle) = spawn_output_writer();

    let _ = out_tx.send(OutputLine::Stderr(format!(
        "Data directory: {}",
        paths.data_dir.display()
    )));
    let view = facade.assemble().await;
    let summary = crate::text_summary::build_text_summary(&view);
    for line in summary.lines {
        let _ = out_tx.send(OutputLine::Stdout(line));
    }
    report_degraded(&view, &out_tx);

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

// A degraded dashboard is still a rendered dashboard; only note it on stderr.
fn report_degraded(view: &DashboardView, out_tx: &mpsc::UnboundedSender<OutputLine>) {
    if let Some(err) = view.error() {
        let _ = out_tx.send(OutputLine::Stderr(format!("warning: {err}")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["extraction-dashboard", "--data-dir", "/tmp/pipeline"]).unwrap();
        assert!(cli.interactive());
        assert_eq!(cli.records_limit.get(), 10);
        assert_eq!(cli.logs_limit.get(), 5);
        assert_eq!(
            std::time::Duration::from(cli.refresh_interval),
            std::time::Duration::from_secs(5)
        );

        let paths = cli.data_paths().unwrap();
        assert_eq!(paths.stats, PathBuf::from("/tmp/pipeline/stats.json"));
        assert_eq!(paths.records, PathBuf::from("/tmp/pipeline/records.jsonl"));
        assert_eq!(paths.operations, PathBuf::from("/tmp/pipeline/operations.jsonl"));
        assert_eq!(paths.log, PathBuf::from("/tmp/pipeline/dashboard.log"));
    }

    #[test]
    fn file_overrides_win_over_data_dir() {
        let cli = Cli::try_parse_from([
            "extraction-dashboard",
            "--data-dir",
            "/tmp/pipeline",
            "--records-file",
            "/srv/records.jsonl",
            "--text",
        ])
        .unwrap();
        assert!(!cli.interactive());
        let paths = cli.data_paths().unwrap();
        assert_eq!(paths.records, PathBuf::from("/srv/records.jsonl"));
        assert_eq!(paths.stats, PathBuf::from("/tmp/pipeline/stats.json"));
    }

    #[test]
    fn zero_limits_are_rejected() {
        assert!(Cli::try_parse_from(["extraction-dashboard", "--records-limit", "0"]).is_err());
        assert!(Cli::try_parse_from(["extraction-dashboard", "--logs-limit", "0"]).is_err());
    }

    #[tokio::test]
    async fn categories_conflicts_with_output_modes() {
        let cli = Cli::try_parse_from(["extraction-dashboard", "--categories", "--json"]).unwrap();
        assert!(run(cli).await.is_err());
    }
}
