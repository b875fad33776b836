//! Configuration file and default locations
//!
//! The bill store never decides where its file lives. This module resolves
//! the database and backup paths from `billtracker.toml`, falling back to the
//! platform data directory.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "billtracker.toml";
pub const DATABASE_FILE: &str = "expense_planner.db";
pub const BACKUP_DIR: &str = "backups";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct BillTrackerConfig {
    pub database: Option<String>,
    pub backup: Option<String>,
}

impl BillTrackerConfig {
    /// Config with every path spelled out under `data_dir`
    pub fn with_defaults_in(data_dir: &Path) -> Self {
        Self {
            database: Some(default_database_path_in(data_dir).display().to_string()),
            backup: Some(default_backup_path_in(data_dir).display().to_string()),
        }
    }

    /// Point the config at an explicit database file
    pub fn with_database(mut self, path: &Path) -> Self {
        self.database = Some(path.display().to_string());
        self
    }

    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        self.database
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| default_database_path_in(data_dir))
    }

    pub fn backup_path(&self, data_dir: &Path) -> PathBuf {
        self.backup
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| default_backup_path_in(data_dir))
    }
}

fn project_dirs() -> anyhow::Result<ProjectDirs> {
    ProjectDirs::from("org", "billtracker", "BillTracker")
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
}

/// Platform data directory, e.g. `~/.local/share/billtracker`
pub fn default_data_dir() -> anyhow::Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Platform config file, e.g. `~/.config/billtracker/billtracker.toml`
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(CONFIG_FILE))
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(DATABASE_FILE)
}

pub fn default_backup_path_in(base: &Path) -> PathBuf {
    base.join(BACKUP_DIR)
}

pub fn load_config(path: &Path) -> anyhow::Result<Option<BillTrackerConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path)?;
    let config: BillTrackerConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &BillTrackerConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Write `config` to `path` if no config file exists there yet.
/// Returns true when a new file was written.
pub fn initialize_config(path: &Path, config: &BillTrackerConfig) -> anyhow::Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    write_config(path, config, false)?;
    tracing::info!("Created config file {}", path.display());
    Ok(true)
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
