use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use shelfcount_config::ShelfConfig;
use shelfcount_media::PreprocessConfig;
use shelfcount_understanding::RecognitionConfig;

/// Effective runtime settings, flattened from a prepared config
/// (overrides and defaults already applied).
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bind_address: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    /// SQLite database path
    pub db_path: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub detail: String,
    pub timeout_secs: u64,
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
    /// Fallback level when `RUST_LOG` is unset
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

fn required<T>(value: Option<T>, path: &str) -> Result<T> {
    value.ok_or_else(|| anyhow!("config field {path} is unset"))
}

impl Settings {
    pub fn from_config(config: &ShelfConfig) -> Result<Self> {
        let server = required(config.server.clone(), "server")?;
        let rec = required(config.recognition.clone(), "recognition")?;
        let image = required(config.image.clone(), "image")?;
        let store = required(config.store.clone(), "store")?;
        let logging = required(config.logging.clone(), "logging")?;

        Ok(Self {
            bind_address: required(server.bind, "server.bind")?,
            port: required(server.port, "server.port")?,
            max_upload_bytes: required(server.max_upload_bytes, "server.maxUploadBytes")?,
            db_path: required(store.db_path, "store.dbPath")?,
            api_key: rec.api_key.filter(|k| !k.is_empty()),
            base_url: required(rec.base_url, "recognition.baseUrl")?,
            model: required(rec.model, "recognition.model")?,
            max_tokens: required(rec.max_tokens, "recognition.maxTokens")?,
            detail: required(rec.detail, "recognition.detail")?,
            timeout_secs: required(rec.timeout_secs, "recognition.timeoutSecs")?,
            max_width: required(image.max_width, "image.maxWidth")?,
            max_height: required(image.max_height, "image.maxHeight")?,
            jpeg_quality: required(image.jpeg_quality, "image.jpegQuality")?,
            log_level: required(logging.level, "logging.level")?,
            log_dir: logging.dir.map(PathBuf::from),
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.bind_address, self.port))
    }

    pub fn preprocess_config(&self) -> PreprocessConfig {
        PreprocessConfig {
            max_width: self.max_width,
            max_height: self.max_height,
            jpeg_quality: self.jpeg_quality,
        }
    }

    pub fn recognition_config(&self) -> Result<RecognitionConfig> {
        let Some(api_key) = &self.api_key else {
            bail!("No API key configured; set OPENAI_API_KEY or recognition.apiKey");
        };
        let mut config = RecognitionConfig::new(api_key.clone())
            .with_base_url(self.base_url.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs));
        config.model = self.model.clone();
        config.max_tokens = self.max_tokens;
        config.detail = self.detail.clone();
        Ok(config)
    }
}
