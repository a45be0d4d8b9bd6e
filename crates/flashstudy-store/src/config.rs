//! Configuration and factories for dataset providers and progress stores.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use flashstudy_core::controller::ControllerConfig;
use flashstudy_core::traits::{DatasetProvider, ProgressStore};

use crate::builtin::StaticDataset;
use crate::file::FileDataset;
use crate::http::{HttpDataset, HttpProgressStore};
use crate::local::{resolve_user_id, FileKeyValueStore, LocalProgressStore};
use crate::memory::MemoryProgressStore;

/// Where study content comes from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatasetConfig {
    /// The bundled sample subjects.
    #[default]
    Builtin,
    /// A JSON/TOML file or a directory of them.
    File { path: PathBuf },
    /// An endpoint serving the subjects map as JSON.
    Http { url: String },
}

/// Where progress is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressConfig {
    /// Key-value file; `path` defaults to the state path.
    Local {
        #[serde(default)]
        path: Option<PathBuf>,
    },
    Remote { url: String },
    Memory,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        ProgressConfig::Local { path: None }
    }
}

/// Top-level flashstudy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashstudyConfig {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    /// Pause before a match verdict, in milliseconds.
    #[serde(default = "default_match_delay_ms")]
    pub match_delay_ms: u64,
    /// User id sent to the remote progress store.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Local key-value state file. Also holds the generated user id.
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
}

fn default_match_delay_ms() -> u64 {
    1000
}

fn default_state_path() -> PathBuf {
    match dirs_path() {
        Some(dir) => dir.join("state.json"),
        None => PathBuf::from(".flashstudy-state.json"),
    }
}

impl Default for FlashstudyConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            progress: ProgressConfig::default(),
            match_delay_ms: default_match_delay_ms(),
            user_id: None,
            state_path: default_state_path(),
        }
    }
}

impl FlashstudyConfig {
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            match_delay: Duration::from_millis(self.match_delay_ms),
        }
    }

    /// Path of the local progress file.
    pub fn local_progress_path(&self) -> &Path {
        match &self.progress {
            ProgressConfig::Local { path: Some(path) } => path.as_path(),
            _ => self.state_path.as_path(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

fn resolve_references(config: &mut FlashstudyConfig) {
    match &mut config.dataset {
        DatasetConfig::Builtin => {}
        DatasetConfig::File { path } => *path = resolve_path(path),
        DatasetConfig::Http { url } => *url = resolve_env_vars(url),
    }
    match &mut config.progress {
        ProgressConfig::Local { path } => {
            if let Some(p) = path {
                *p = resolve_path(p);
            }
        }
        ProgressConfig::Remote { url } => *url = resolve_env_vars(url),
        ProgressConfig::Memory => {}
    }
    if let Some(id) = &mut config.user_id {
        *id = resolve_env_vars(id);
    }
    config.state_path = resolve_path(&config.state_path);
}

/// Apply `FLASHSTUDY_*` overrides read through `lookup`.
fn apply_env_overrides(config: &mut FlashstudyConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("FLASHSTUDY_DATASET_URL") {
        config.dataset = DatasetConfig::Http { url };
    }
    if let Some(url) = lookup("FLASHSTUDY_PROGRESS_URL") {
        config.progress = ProgressConfig::Remote { url };
    }
    if let Some(id) = lookup("FLASHSTUDY_USER_ID") {
        config.user_id = Some(id);
    }
    if let Some(path) = lookup("FLASHSTUDY_STATE_PATH") {
        config.state_path = PathBuf::from(path);
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `flashstudy.toml` in the current directory
/// 2. `~/.config/flashstudy/config.toml`
///
/// Environment variable overrides: `FLASHSTUDY_DATASET_URL`,
/// `FLASHSTUDY_PROGRESS_URL`, `FLASHSTUDY_USER_ID`, `FLASHSTUDY_STATE_PATH`.
pub fn load_config() -> Result<FlashstudyConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<FlashstudyConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("flashstudy.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            parse_config(&path)?
        }
        None => FlashstudyConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    resolve_references(&mut config);
    Ok(config)
}

fn parse_config(path: &Path) -> Result<FlashstudyConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("failed to parse config: {}", path.display()))
}

/// `~/.config/flashstudy`, when `HOME` is set.
pub fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .filter(|h| !h.is_empty())
        .map(|h| PathBuf::from(h).join(".config").join("flashstudy"))
}

/// Create a dataset provider from its configuration.
pub fn create_dataset_provider(config: &DatasetConfig) -> Result<Box<dyn DatasetProvider>> {
    match config {
        DatasetConfig::Builtin => Ok(Box::new(StaticDataset::sample())),
        DatasetConfig::File { path } => Ok(Box::new(FileDataset::new(path.clone()))),
        DatasetConfig::Http { url } => Ok(Box::new(HttpDataset::new(url)?)),
    }
}

/// Create the progress store selected by `config`.
///
/// The remote store resolves its user id through the local state file.
pub fn create_progress_store(config: &FlashstudyConfig) -> Result<Arc<dyn ProgressStore>> {
    match &config.progress {
        ProgressConfig::Local { .. } => {
            let kv = FileKeyValueStore::open(config.local_progress_path())?;
            Ok(Arc::new(LocalProgressStore::new(Arc::new(kv))))
        }
        ProgressConfig::Remote { url } => {
            let kv = FileKeyValueStore::open(&config.state_path)?;
            let user_id = resolve_user_id(&kv, config.user_id.as_deref())?;
            Ok(Arc::new(HttpProgressStore::new(url, user_id)?))
        }
        ProgressConfig::Memory => Ok(Arc::new(MemoryProgressStore::new())),
    }
}
