//! Jenkins usage statistics
//!
//! Batch commands over the monthly fact table:
//! - `import`: fold gzip-compressed daily snapshot files into the store
//! - `report`: compute the monthly aggregate reports and write them as JSON

mod render;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{error, info};

use ingest::Importer;
use stats_core::YearMonth;
use stats_store::health::check_connection;
use stats_store::{DatabaseConfig, StatsDb};
use telemetry::{init_tracing_from_env, ImportMetrics};

/// Application configuration.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct Config {
    /// Used when no command is given on the command line
    #[serde(default)]
    command: Option<String>,

    #[serde(default)]
    database: DatabaseConfig,

    #[serde(default)]
    import: ImportConfig,

    #[serde(default)]
    report: ReportConfig,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct ImportConfig {
    /// Directory holding the `*.gz` daily files
    #[serde(default = "default_import_dir")]
    directory: PathBuf,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct ReportConfig {
    #[serde(default = "default_report_dir")]
    directory: PathBuf,
    /// Month treated as current (incomplete); defaults to now
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    month: Option<u32>,
}

fn default_import_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            directory: default_import_dir(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            directory: default_report_dir(),
            year: None,
            month: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Import,
    Report,
}

impl Command {
    fn parse(raw: &str) -> Result<Self> {
        match raw {
            "import" => Ok(Self::Import),
            "report" => Ok(Self::Report),
            other => bail!("unknown command '{other}' (expected 'import' or 'report')"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting usage-stats v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    let command = match std::env::args().nth(1).or_else(|| config.command.clone()) {
        Some(raw) => Command::parse(&raw)?,
        None => bail!("no command given (expected 'import' or 'report')"),
    };

    let db = StatsDb::connect(config.database.clone())
        .await
        .context("Failed to open statistics database")?;

    if check_connection(&db).await {
        info!(url = %config.database.url, "Database connection: healthy");
    } else {
        error!(url = %config.database.url, "Database connection: unhealthy");
        bail!("statistics database is unreachable");
    }

    let result = match command {
        Command::Import => run_import(&db, &config.import).await,
        Command::Report => run_report(&db, &config.report).await,
    };

    db.close().await;
    result
}

async fn run_import(db: &StatsDb, config: &ImportConfig) -> Result<()> {
    info!(directory = %config.directory.display(), "Importing daily files");

    let metrics = Arc::new(ImportMetrics::new());
    let mut importer = Importer::with_metrics(db.clone(), metrics.clone());
    let summary = importer
        .import_directory(&config.directory)
        .await
        .context("Import failed")?;

    info!(
        files_imported = summary.files_imported,
        files_skipped = summary.files_skipped,
        snapshots = summary.snapshots_seen,
        inserted = summary.inserted,
        updated = summary.updated,
        counts_advanced = summary.counts_advanced,
        skipped = summary.skipped,
        tolerated = summary.tolerated_decode_skips,
        "Import complete"
    );
    metrics.log_summary();
    Ok(())
}

async fn run_report(db: &StatsDb, config: &ReportConfig) -> Result<()> {
    let current = match (config.year, config.month) {
        (Some(year), Some(month)) => YearMonth::new(year, month)
            .with_context(|| format!("invalid report month {year}-{month}"))?,
        (None, None) => YearMonth::current(),
        _ => bail!("report.year and report.month must be set together"),
    };

    info!(current = %current, directory = %config.directory.display(), "Generating reports");
    render::render_all(db, &config.directory, current).await?;
    info!("Report generation complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("USAGE_STATS")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}
