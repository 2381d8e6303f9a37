use crate::keyed::RowPolicy;
use crate::source::{RowFilter, DEFAULT_PLACEHOLDER};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const LOCAL_CONFIG_FILE: &str = "tabsnap.toml";
const GLOBAL_CONFIG_DIR: &str = ".tabsnap";
const GLOBAL_CONFIG_FILE: &str = "global.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub keyed: KeyedConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding the CSV workbooks
    pub root: PathBuf,
    /// Cell values that count as empty when dropping blank rows
    #[serde(default = "default_placeholders")]
    pub placeholders: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub default_name_pattern: String,
    pub workspace_dir: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyedConfig {
    #[serde(default)]
    pub policy: RowPolicy,
}

fn default_placeholders() -> Vec<String> {
    vec![DEFAULT_PLACEHOLDER.to_string()]
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            placeholders: default_placeholders(),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            default_name_pattern: "{sheet}_{seq}".to_string(),
            workspace_dir: PathBuf::from(".tabsnap"),
        }
    }
}

impl SourceConfig {
    pub fn row_filter(&self) -> RowFilter {
        RowFilter::new(self.placeholders.clone())
    }
}

fn global_config_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(GLOBAL_CONFIG_DIR))
        .unwrap_or_else(|| PathBuf::from(GLOBAL_CONFIG_DIR))
        .join(GLOBAL_CONFIG_FILE)
}

fn read_config(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
}

/// Load configuration.
///
/// Priority (highest first): the file named by `TABSNAP_CONFIG`, a local
/// `tabsnap.toml` in `dir` (or the current directory), the global
/// `~/.tabsnap/global.toml`, defaults. `TABSNAP_DEFAULT_NAME_PATTERN`
/// overrides the snapshot name pattern in every case.
pub fn get_config_in(dir: Option<&Path>) -> Result<Config> {
    let mut config = if let Ok(explicit) = env::var("TABSNAP_CONFIG") {
        read_config(Path::new(&explicit))?
    } else {
        let local = match dir {
            Some(dir) => dir.join(LOCAL_CONFIG_FILE),
            None => env::current_dir()?.join(LOCAL_CONFIG_FILE),
        };
        let global = global_config_path();

        if local.exists() {
            read_config(&local)?
        } else if global.exists() {
            read_config(&global)?
        } else {
            Config::default()
        }
    };

    if let Ok(pattern) = env::var("TABSNAP_DEFAULT_NAME_PATTERN") {
        config.snapshot.default_name_pattern = pattern;
    }

    log::debug!("Using configuration: {config:?}");
    Ok(config)
}

pub fn get_config() -> Result<Config> {
    get_config_in(None)
}

/// Write `config` to the global config file
pub fn save_config(config: &Config) -> Result<PathBuf> {
    let path = global_config_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, toml::to_string_pretty(config)?)?;
    Ok(path)
}
