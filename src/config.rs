use crate::errors::{AppError, AppResult};
use crate::queries::{QuerySet, DEFAULT_TABLE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CONFIG: &str = "SLA_DASHBOARD_CONFIG";
pub const ENV_WAREHOUSE: &str = "SLA_DASHBOARD_WAREHOUSE";
pub const ENV_TABLE: &str = "SLA_DASHBOARD_TABLE";
pub const ENV_LOG_DIR: &str = "SLA_DASHBOARD_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct WarehouseConfig {
    pub path: PathBuf,
    pub table: String,
    pub busy_timeout_ms: u64,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("warehouse.db"),
            table: DEFAULT_TABLE.to_string(),
            busy_timeout_ms: 5000,
        }
    }
}

impl WarehouseConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct DashboardConfig {
    pub warehouse: WarehouseConfig,
    pub logging: LoggingConfig,
}

impl DashboardConfig {
    /// Reads a YAML config. A missing file yields the defaults.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> AppResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> AppResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_WAREHOUSE).filter(|value| !value.trim().is_empty()) {
            self.warehouse.path = PathBuf::from(path);
        }
        if let Some(table) = lookup(ENV_TABLE).filter(|value| !value.trim().is_empty()) {
            self.warehouse.table = table.trim().to_string();
        }
        if let Some(dir) = lookup(ENV_LOG_DIR).filter(|value| !value.trim().is_empty()) {
            self.logging.dir = PathBuf::from(dir);
        }
        self.validate()
    }

    pub fn validate(&self) -> AppResult<()> {
        QuerySet::new(&self.warehouse.table)?;
        if self.logging.level.trim().is_empty() {
            return Err(AppError::Config("logging.level cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn query_set(&self) -> AppResult<QuerySet> {
        QuerySet::new(&self.warehouse.table)
    }
}
