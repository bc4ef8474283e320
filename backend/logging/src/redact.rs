//! Log Redaction Layer
//!
//! Scrubs API keys, bearer tokens and inline base64 image payloads from strings
//! prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[A-Za-z0-9_\-]{16,})|(Bearer\s+[A-Za-z0-9\-\._~+/]+=*)").unwrap()
});
static DATA_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"data:([a-z]+/[a-z0-9.+\-]+);base64,[A-Za-z0-9+/=]+").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]");
    DATA_URL_RE
        .replace_all(&redacted, "data:$1;base64,[REDACTED_IMAGE]")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_keys_and_tokens() {
        let raw = "auth failed for sk-abcdefghijklmnop1234 with Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("sk-abcdefghijklmnop1234"));
        assert!(!clean.contains("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"));
        assert!(clean.starts_with("auth failed for [REDACTED_TOKEN]"));
    }

    #[test]
    fn test_redacts_inline_images() {
        let clean = redact_sensitive_data(r#"{"url":"data:image/jpeg;base64,/9j/4AAQSkZJRg=="}"#);
        assert_eq!(clean, r#"{"url":"data:image/jpeg;base64,[REDACTED_IMAGE]"}"#);
    }

    #[test]
    fn test_plain_answers_pass_through() {
        assert_eq!(redact_sensitive_data("2, Banana"), "2, Banana");
    }
}
