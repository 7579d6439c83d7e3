pub mod cache;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod errors;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod presentation;
pub mod queries;
pub mod redaction;
pub mod session;

use crate::config::{DashboardConfig, LoggingConfig, ENV_CONFIG};
use crate::dashboard::SlaDashboard;
use crate::db::{DataSource, SqliteDataSource};
use crate::filter::FilterSelection;
use crate::presentation::json::JsonPresenter;
use crate::session::DashboardSession;
use anyhow::Context;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

const DEFAULT_CONFIG_PATH: &str = "dashboard.yaml";

/// Renders one dashboard pass for the branches given on the command line and
/// writes the view to stdout as JSON.
pub fn run() -> anyhow::Result<()> {
    let config_path = std::env::var(ENV_CONFIG)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = DashboardConfig::load(&config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    config.apply_env_overrides()?;

    init_tracing(&config.logging).map_err(anyhow::Error::msg)?;

    let source = SqliteDataSource::new(&config.warehouse.path)
        .with_busy_timeout(config.warehouse.busy_timeout());
    let queries = config.query_set()?;
    tracing::info!(source = %source.describe(), table = queries.table(), "starting dashboard");

    let mut dashboard = SlaDashboard::new(Box::new(source), queries, DashboardSession::new());
    let selection = FilterSelection::new(std::env::args().skip(1));

    let stdout = std::io::stdout();
    let mut presenter = JsonPresenter::new(stdout.lock(), true);
    dashboard.render_to(&selection, &mut presenter)?;
    Ok(())
}

pub fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    std::fs::create_dir_all(&logging.dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(&logging.dir, "dashboard.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level)),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())
}
