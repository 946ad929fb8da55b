//! Configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `catalog.toml` +
//! `catalog.<env>.toml` + `CATALOG_*` env vars (`__` separates nested keys).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub extract: ExtractConfig,
    pub search: SearchConfig,
    pub log: LogConfig,
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub raw_dir: String,
    pub index_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractConfig {
    pub fallback_currency: String,
    pub max_description_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub default_limit: Option<usize>,
    pub max_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    pub filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig {
                raw_dir: "data".to_string(),
                index_path: "data/catalog_index.json".to_string(),
            },
            extract: ExtractConfig::default(),
            search: SearchConfig { default_limit: None, max_limit: 100 },
            log: LogConfig { filter: "info".to_string() },
            base_dir: PathBuf::from("."),
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { fallback_currency: "USD".to_string(), max_description_chars: 2000 }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_for_env(None)
    }

    pub fn load_for_env(env: Option<&str>) -> Result<Self> {
        let env_name = env
            .map(str::to_string)
            .unwrap_or_else(|| env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string()));

        let mut figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("catalog.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("catalog.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("catalog.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("catalog.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("CATALOG_").split("__"));

        let mut config: Config = figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.base_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let currency = &self.extract.fallback_currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::InvalidConfig(format!(
                "extract.fallback_currency must be a three-letter code, got '{currency}'"
            )));
        }
        if self.extract.max_description_chars == 0 {
            return Err(Error::InvalidConfig("extract.max_description_chars must be > 0".into()));
        }
        if let Some(limit) = self.search.default_limit {
            if limit > self.search.max_limit {
                return Err(Error::InvalidConfig(format!(
                    "search.default_limit ({limit}) exceeds search.max_limit ({})",
                    self.search.max_limit
                )));
            }
        }
        if self.data.raw_dir.trim().is_empty() || self.data.index_path.trim().is_empty() {
            return Err(Error::InvalidConfig("data.raw_dir and data.index_path must be set".into()));
        }
        Ok(())
    }

    pub fn raw_dir(&self) -> PathBuf {
        resolve_with_base(&self.base_dir, &self.data.raw_dir)
    }

    pub fn index_path(&self) -> PathBuf {
        resolve_with_base(&self.base_dir, &self.data.index_path)
    }

    /// Caller-requested limit clamped to `search.max_limit`; falls back to the default.
    pub fn effective_limit(&self, requested: Option<usize>) -> Option<usize> {
        requested
            .or(self.search.default_limit)
            .map(|l| l.min(self.search.max_limit))
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
