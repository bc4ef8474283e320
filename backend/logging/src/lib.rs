//! Telemetry and structured logging for shelfcount.
//!
//! Console + rolling NDJSON file output, secret/payload redaction, and
//! per-upload pipeline events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{EventLogger, PipelineEvent, PipelineEventEntry};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
