//! Config defaults: fill every unset field after loading.

use crate::schema::{
    ImageConfig, LoggingConfig, RecognitionConfig, ServerConfig, ShelfConfig, StoreConfig,
};

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
/// 16 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

// Component defaults live with the components that use them.
pub use shelfcount_media::preprocess::{DEFAULT_JPEG_QUALITY, DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH};
pub use shelfcount_understanding::vision::{
    DEFAULT_BASE_URL, DEFAULT_DETAIL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
};

pub const DEFAULT_TIMEOUT_SECS: u64 = shelfcount_understanding::vision::DEFAULT_TIMEOUT.as_secs();

pub const DEFAULT_DB_PATH: &str = "instance/results.db";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: ShelfConfig) -> ShelfConfig {
    let config = apply_server_defaults(config);
    let config = apply_recognition_defaults(config);
    let config = apply_image_defaults(config);
    let config = apply_store_defaults(config);
    apply_logging_defaults(config)
}

fn apply_server_defaults(mut config: ShelfConfig) -> ShelfConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    server.bind.get_or_insert_with(|| DEFAULT_BIND.to_string());
    server.port.get_or_insert(DEFAULT_PORT);
    server.max_upload_bytes.get_or_insert(DEFAULT_MAX_UPLOAD_BYTES);
    config
}

/// The API key has no default; it usually arrives through `OPENAI_API_KEY`.
fn apply_recognition_defaults(mut config: ShelfConfig) -> ShelfConfig {
    let rec = config.recognition.get_or_insert_with(RecognitionConfig::default);
    rec.base_url.get_or_insert_with(|| DEFAULT_BASE_URL.to_string());
    rec.model.get_or_insert_with(|| DEFAULT_MODEL.to_string());
    rec.max_tokens.get_or_insert(DEFAULT_MAX_TOKENS);
    rec.detail.get_or_insert_with(|| DEFAULT_DETAIL.to_string());
    rec.timeout_secs.get_or_insert(DEFAULT_TIMEOUT_SECS);
    config
}

fn apply_image_defaults(mut config: ShelfConfig) -> ShelfConfig {
    let image = config.image.get_or_insert_with(ImageConfig::default);
    image.max_width.get_or_insert(DEFAULT_MAX_WIDTH);
    image.max_height.get_or_insert(DEFAULT_MAX_HEIGHT);
    image.jpeg_quality.get_or_insert(DEFAULT_JPEG_QUALITY);
    config
}

fn apply_store_defaults(mut config: ShelfConfig) -> ShelfConfig {
    let store = config.store.get_or_insert_with(StoreConfig::default);
    store.db_path.get_or_insert_with(|| DEFAULT_DB_PATH.to_string());
    config
}

fn apply_logging_defaults(mut config: ShelfConfig) -> ShelfConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    config
}
