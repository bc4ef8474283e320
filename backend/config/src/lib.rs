//! `shelfcount-config`: runtime configuration.
//!
//! Provides:
//! - Typed config schema (server, recognition, image, store, logging)
//! - YAML loading with first-run defaults
//! - `${ENV_VAR}` substitution and environment overrides
//! - Config redaction for safe logging
//! - Default value application and validation

pub mod defaults;
pub mod env;
pub mod io;
pub mod overrides;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config};
pub use overrides::apply_env_overrides;
pub use redact::{redact, redacted_snapshot};
pub use schema::ShelfConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load a config file, substitute `${VAR}`s, apply environment overrides and
/// defaults, then validate.
///
/// Validation errors abort. Warnings come back with the config so the caller
/// can log them once its subscriber is installed.
pub async fn load_and_prepare(path: &Path) -> Result<(ShelfConfig, ValidationReport)> {
    let raw_config = load_config(path).await?;
    let value: Value =
        serde_json::to_value(&raw_config).context("Failed to serialize config for processing")?;
    prepare_value(value, &std::env::vars().collect())
}

fn prepare_value(
    value: Value,
    env: &HashMap<String, String>,
) -> Result<(ShelfConfig, ValidationReport)> {
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;

    let config: ShelfConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;
    let config = apply_env_overrides(config, env)?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    if !report.is_valid() {
        let errors: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        bail!(errors.join("; "));
    }

    Ok((config, report))
}
