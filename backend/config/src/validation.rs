//! Config validation with field paths in every message.

use crate::schema::ShelfConfig;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// Errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &ShelfConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_recognition(config, &mut report);
    validate_image(config, &mut report);
    validate_store(config, &mut report);
    report
}

fn validate_server(config: &ShelfConfig, report: &mut ValidationReport) {
    let Some(server) = &config.server else { return };
    if server.port == Some(0) {
        report.error("server.port", "port must be > 0");
    }
    if server.max_upload_bytes == Some(0) {
        report.error("server.maxUploadBytes", "maxUploadBytes must be > 0");
    }
}

fn validate_recognition(config: &ShelfConfig, report: &mut ValidationReport) {
    let Some(rec) = &config.recognition else { return };
    if rec.api_key.as_deref().map(str::is_empty).unwrap_or(true) {
        report.warn(
            "recognition.apiKey",
            "No API key configured; set OPENAI_API_KEY or recognition.apiKey before serving",
        );
    }
    if rec.timeout_secs == Some(0) {
        report.error("recognition.timeoutSecs", "timeoutSecs must be > 0");
    }
    if rec.max_tokens == Some(0) {
        report.error("recognition.maxTokens", "maxTokens must be > 0");
    }
    if let Some(detail) = rec.detail.as_deref() {
        if !matches!(detail, "low" | "high" | "auto") {
            report.error(
                "recognition.detail",
                format!("detail must be one of low, high, auto (got {detail:?})"),
            );
        }
    }
    if let Some(url) = rec.base_url.as_deref() {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            report.error("recognition.baseUrl", "baseUrl must be an http(s) URL");
        }
    }
}

fn validate_image(config: &ShelfConfig, report: &mut ValidationReport) {
    let Some(image) = &config.image else { return };
    if image.max_width == Some(0) || image.max_height == Some(0) {
        report.error("image", "maxWidth and maxHeight must be > 0");
    }
    if let Some(q) = image.jpeg_quality {
        if !(1..=100).contains(&q) {
            report.error("image.jpegQuality", "jpegQuality must be within 1..=100");
        }
    }
}

fn validate_store(config: &ShelfConfig, report: &mut ValidationReport) {
    let Some(store) = &config.store else { return };
    if store.db_path.as_deref().map(str::trim) == Some("") {
        report.error("store.dbPath", "dbPath cannot be empty");
    }
}
