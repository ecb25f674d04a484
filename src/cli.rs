use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Environment variable the serving layer uses to locate the analyzer store.
pub const ANALYZER_DB_ENV: &str = "ECFR_ANALYZER_DB";

#[derive(Parser, Debug)]
#[command(
    name = "ecfr",
    version,
    about = "eCFR section normalization, ingestion, and metrics tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Normalize(NormalizeArgs),
    Ingest(IngestArgs),
    Metrics(MetricsArgs),
    Render(RenderArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct NormalizeArgs {
    /// Directory containing exported title*.json documents.
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Output root for per-section artifacts; defaults to the data directory.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    /// Delete the normalization cache before running, recomputing everything.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Root directory containing sections/title*/ artifacts.
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Analyzer database path; falls back to ECFR_ANALYZER_DB, then
    /// <data_dir>/analyzer.sqlite.
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    /// Clear all derived tables before ingesting (clean rebuild).
    #[arg(long, default_value_t = false)]
    pub replace: bool,

    /// Skip sections whose stored content hash is unchanged.
    #[arg(long, default_value_t = false)]
    pub changed_only: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MetricsArgs {
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    /// Cap the number of sections scored in one pass.
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Path to one normalized per-section artifact.
    #[arg(long)]
    pub artifact_path: PathBuf,

    #[arg(long, value_enum, default_value_t = RenderFormat::Markdown)]
    pub format: RenderFormat,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RenderFormat {
    Html,
    Markdown,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

/// Resolve the analyzer database path from an explicit argument, the serving
/// layer's environment variable, or the data-directory default.
pub fn resolve_db_path(explicit: Option<PathBuf>, data_dir: &Path) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os(ANALYZER_DB_ENV).map(PathBuf::from))
        .unwrap_or_else(|| data_dir.join("analyzer.sqlite"))
}
