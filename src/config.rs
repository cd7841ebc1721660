use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::DEFAULT_CONCURRENCY;
use crate::error::KeggError;
use crate::kegg::KEGG_REST_BASE;

pub const DEFAULT_CONFIG_FILE: &str = "keggpull.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub concurrency: usize,
    pub timeout: Duration,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit `path` must exist; otherwise `keggpull.json` is read when present.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, KeggError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Self::resolve_config(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| KeggError::ConfigRead(config_path.clone()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|err| KeggError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, KeggError> {
        let base_url = config
            .base_url
            .map(|url| url.trim().to_string())
            .unwrap_or_else(|| KEGG_REST_BASE.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(KeggError::ConfigParse(format!(
                "base_url must be an http(s) URL: {base_url}"
            )));
        }

        let concurrency = config.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(KeggError::ConfigParse(
                "concurrency must be at least 1".to_string(),
            ));
        }

        Ok(ResolvedConfig {
            base_url,
            concurrency,
            timeout: Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        })
    }
}
