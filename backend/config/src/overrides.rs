//! Environment overrides layered on top of the config file.
//!
//! Applied before defaults and validation, so an override is checked like any
//! other value.

use anyhow::{bail, Result};
use std::collections::HashMap;

use crate::schema::{RecognitionConfig, ServerConfig, ShelfConfig, StoreConfig};

pub const ENV_BIND: &str = "SHELFCOUNT_BIND";
pub const ENV_PORT: &str = "SHELFCOUNT_PORT";
pub const ENV_DB: &str = "SHELFCOUNT_DB";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";

/// Overwrite config fields from the given environment. Empty variables are
/// ignored; a variable that is set but malformed is an error.
pub fn apply_env_overrides(
    mut config: ShelfConfig,
    env: &HashMap<String, String>,
) -> Result<ShelfConfig> {
    let var = |name: &str| env.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

    if let Some(bind) = var(ENV_BIND) {
        config.server.get_or_insert_with(ServerConfig::default).bind = Some(bind.to_string());
    }
    if let Some(raw) = var(ENV_PORT) {
        let Ok(port) = raw.parse::<u16>() else {
            bail!("{ENV_PORT}={raw:?} is not a valid port number");
        };
        config.server.get_or_insert_with(ServerConfig::default).port = Some(port);
    }
    if let Some(db) = var(ENV_DB) {
        config.store.get_or_insert_with(StoreConfig::default).db_path = Some(db.to_string());
    }
    if let Some(key) = var(ENV_API_KEY) {
        config
            .recognition
            .get_or_insert_with(RecognitionConfig::default)
            .api_key = Some(key.to_string());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn env_overrides_file_values() {
        let file = ShelfConfig {
            server: Some(ServerConfig {
                port: Some(9000),
                bind: Some("0.0.0.0".into()),
                ..Default::default()
            }),
            recognition: Some(RecognitionConfig {
                api_key: Some("sk-file".into()),
                model: Some("gpt-4o-mini".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = apply_env_overrides(
            file,
            &env(&[
                (ENV_PORT, "7000"),
                (ENV_DB, "/tmp/t.db"),
                (ENV_API_KEY, "sk-env"),
            ]),
        )
        .unwrap();

        let server = config.server.unwrap();
        assert_eq!(server.port, Some(7000));
        assert_eq!(server.bind.as_deref(), Some("0.0.0.0"));
        assert_eq!(config.store.unwrap().db_path.as_deref(), Some("/tmp/t.db"));
        let rec = config.recognition.unwrap();
        assert_eq!(rec.api_key.as_deref(), Some("sk-env"));
        assert_eq!(rec.model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn malformed_port_is_an_error() {
        for raw in ["http", "70000", "-1"] {
            let err = apply_env_overrides(ShelfConfig::default(), &env(&[(ENV_PORT, raw)]))
                .unwrap_err();
            assert!(err.to_string().contains(ENV_PORT), "{raw}: {err}");
        }
    }

    #[test]
    fn empty_variables_are_ignored() {
        let config = apply_env_overrides(
            ShelfConfig::default(),
            &env(&[(ENV_PORT, ""), (ENV_API_KEY, "  ")]),
        )
        .unwrap();
        assert_eq!(config, ShelfConfig::default());
    }
}
