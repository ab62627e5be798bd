//! Process configuration.
//!
//! Loaded once at startup and passed down explicitly; nothing here is cached
//! in a global.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level digiclass configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigiclassConfig {
    /// Display name of the installation.
    #[serde(default = "default_project_name")]
    pub project_name: String,
    /// Where the JSON snapshot store lives.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Page size used when a listing does not ask for one.
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    /// Upper bound for requested page sizes.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

fn default_project_name() -> String {
    "Digital Classroom".to_string()
}
fn default_store_path() -> PathBuf {
    PathBuf::from("./digiclass-data/store.json")
}
fn default_page_size() -> usize {
    20
}
fn default_max_page_size() -> usize {
    100
}

impl Default for DigiclassConfig {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
            store_path: default_store_path(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl DigiclassConfig {
    /// The subset of configuration the submission service needs.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size.max(1),
        }
    }
}

/// Settings for [`crate::service::SubmissionService`].
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        DigiclassConfig::default().service_config()
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not scanned again, so a value that itself contains
/// `${...}` is kept literally.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!(
            "{}{}{}",
            &result[..start],
            value,
            &result[start + end + 1..]
        );
        from = start + value.len();
    }
    result
}

/// Load config from an explicit path, or search the default locations.
///
/// Without an explicit path the search order is:
/// 1. `digiclass.toml` in the current directory
/// 2. `~/.config/digiclass/config.toml`
///
/// Environment variable override: `DIGICLASS_STORE_PATH`.
pub fn load_config_from(path: Option<&Path>) -> Result<DigiclassConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("digiclass.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<DigiclassConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => DigiclassConfig::default(),
    };

    config.project_name = resolve_env_vars(&config.project_name);
    config.store_path = PathBuf::from(resolve_env_vars(&config.store_path.to_string_lossy()));

    if let Ok(store_path) = std::env::var("DIGICLASS_STORE_PATH") {
        if !store_path.is_empty() {
            config.store_path = PathBuf::from(store_path);
        }
    }

    anyhow::ensure!(
        config.default_page_size >= 1,
        "default_page_size must be at least 1"
    );

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("digiclass"))
}
