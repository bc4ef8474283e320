//! Config file location and loading.

use crate::schema::ShelfConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the config directory.
/// Priority: `SHELFCOUNT_CONFIG_DIR` env > `~/.shelfcount/` > `./.shelfcount`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SHELFCOUNT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .map(|home| home.join(".shelfcount"))
        .unwrap_or_else(|| PathBuf::from(".shelfcount"))
}

pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Load and parse the config from disk.
///
/// Returns `Ok(Default::default())` if the file doesn't exist (first run).
pub async fn load_config(path: &Path) -> Result<ShelfConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(ShelfConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    // An empty file parses as YAML null.
    if raw.trim().is_empty() {
        return Ok(ShelfConfig::default());
    }

    let config: ShelfConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&config_file_path(dir.path())).await.unwrap();
        assert_eq!(config, ShelfConfig::default());
    }

    #[tokio::test]
    async fn test_parses_camel_case_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        tokio::fs::write(
            &path,
            "server:\n  port: 9000\n  maxUploadBytes: 1024\nimage:\n  jpegQuality: 70\n",
        )
        .await
        .unwrap();

        let config = load_config(&path).await.unwrap();
        let server = config.server.unwrap();
        assert_eq!(server.port, Some(9000));
        assert_eq!(server.max_upload_bytes, Some(1024));
        assert_eq!(config.image.unwrap().jpeg_quality, Some(70));
    }

    #[tokio::test]
    async fn test_empty_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        tokio::fs::write(&path, "\n").await.unwrap();
        assert_eq!(load_config(&path).await.unwrap(), ShelfConfig::default());
    }

    #[tokio::test]
    async fn test_malformed_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = config_file_path(dir.path());
        tokio::fs::write(&path, "server: [unclosed").await.unwrap();
        assert!(load_config(&path).await.is_err());
    }
}
