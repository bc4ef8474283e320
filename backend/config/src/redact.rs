//! Config redaction: mask secrets before a config snapshot is logged or printed.

use serde_json::Value;

use crate::schema::ShelfConfig;

static SENSITIVE_KEYS: &[&str] = &[
    "apiKey",
    "api_key",
    "token",
    "accessToken",
    "secret",
    "password",
];

/// Redact a config JSON value, masking every sensitive field.
///
/// The first 4 characters survive so operators can tell keys apart.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

/// Redacted JSON snapshot of a typed config.
pub fn redacted_snapshot(config: &ShelfConfig) -> Value {
    serde_json::to_value(config)
        .map(|v| redact(&v))
        .unwrap_or(Value::Null)
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if is_sensitive_key(key) && !s.is_empty() => {
            let hint: String = s.chars().take(4).collect();
            if s.chars().count() > 4 {
                Value::String(format!("{hint}***"))
            } else {
                Value::String("***".to_string())
            }
        }
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_recursive(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RecognitionConfig;
    use serde_json::json;

    #[test]
    fn redacts_api_key() {
        let v = json!({ "recognition": { "apiKey": "sk-abcdef123456" } });
        let redacted = redact(&v);
        assert_eq!(redacted["recognition"]["apiKey"], "sk-a***");
    }

    #[test]
    fn short_secrets_are_fully_masked() {
        let v = json!({ "apiKey": "abc" });
        assert_eq!(redact(&v)["apiKey"], "***");
    }

    #[test]
    fn passthrough_non_sensitive() {
        let v = json!({ "logging": { "level": "debug" }, "server": { "port": 8080 } });
        assert_eq!(redact(&v), v);
    }

    #[test]
    fn snapshot_of_typed_config() {
        let config = ShelfConfig {
            recognition: Some(RecognitionConfig {
                api_key: Some("sk-live-000000".into()),
                model: Some("gpt-4o".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let snapshot = redacted_snapshot(&config);
        assert_eq!(snapshot["recognition"]["apiKey"], "sk-l***");
        assert_eq!(snapshot["recognition"]["model"], "gpt-4o");
    }
}
