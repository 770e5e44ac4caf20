//! Store configuration.
//!
//! Read from `config.json` in the platform config directory. A missing or
//! broken file falls back to the defaults, which carry the `Handbuch` aliases.
//! `AGGREGATES_DB_PATH` overrides the database location.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::naming::DefaultNaming;

const CONFIG_FILE: &str = "config.json";
const DB_PATH_ENV: &str = "AGGREGATES_DB_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite file. `None` means the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub naming: NamingConfig,
}

/// Alias tables for the naming strategy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NamingConfig {
    pub default_naming: DefaultNaming,
    /// Default table name to schema table name.
    pub table_aliases: BTreeMap<String, String>,
    /// `"<table>.<column>"` to schema column name.
    pub column_aliases: BTreeMap<String, String>,
    /// Root table name to the child's back-reference column.
    pub back_reference_aliases: BTreeMap<String, String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        let pairs = |items: &[(&str, &str)]| -> BTreeMap<String, String> {
            items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };
        Self {
            default_naming: DefaultNaming::AsIs,
            table_aliases: pairs(&[("Manual", "Handbuch")]),
            column_aliases: pairs(&[
                ("LegoSet.max_age_years", "maxAge"),
                ("LegoSet.min_age_years", "minAge"),
                ("Handbuch.id", "Handbuch_id"),
            ]),
            back_reference_aliases: pairs(&[("LegoSet", "Handbuch_id")]),
        }
    }
}

impl StoreConfig {
    /// Loads the config file, then applies environment overrides.
    pub fn load() -> Self {
        let mut config = match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.apply_env();
        config
    }

    fn try_load() -> Result<Self> {
        let config_path = config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(&config_path)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content).context("Failed to parse config file")
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            if !path.trim().is_empty() {
                self.database_path = Some(PathBuf::from(path));
            }
        }
    }
}

fn config_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "aggregates")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    Ok(dirs.config_dir().join(CONFIG_FILE))
}
