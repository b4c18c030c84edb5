//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend base URL, including the API prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Path to the credentials file; defaults to the user config directory
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
}

impl Config {
    /// Resolve where the session credentials live
    pub fn credentials_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.session.credentials_path {
            return Ok(path.clone());
        }
        let base = dirs::config_dir().context("no user configuration directory available")?;
        Ok(base.join("maquette").join("credentials.json"))
    }
}

/// Load configuration from file, falling back to defaults
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.session.credentials_path.is_none());
    }

    #[test]
    fn test_partial_override() {
        let config: Config = toml::from_str(
            "[api]\nbase_url = \"https://models.example.com/api\"\n",
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://models.example.com/api");
        assert_eq!(config.api.timeout_secs, 30);
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maquette.toml");
        std::fs::write(
            &path,
            "[session]\ncredentials_path = \"/tmp/creds.json\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(
            config.credentials_path().unwrap(),
            PathBuf::from("/tmp/creds.json")
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config(Path::new("/nonexistent/maquette.toml")).unwrap();
        assert_eq!(config.api.timeout_secs, 30);
    }
}
