//! Pipeline Event Logger
//!
//! One structured event per pipeline stage (normalized, recognized, tallied,
//! failed), emitted on the `pipeline_events` target so they can be filtered
//! into their own NDJSON stream.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    Normalized {
        filename: String,
        before_bytes: usize,
        after_bytes: usize,
        width: u32,
        height: u32,
    },
    Recognized {
        provider: String,
        answer: String,
    },
    Tallied {
        record_id: i64,
        object_name: String,
        added: u32,
        total: u32,
    },
    Failed {
        stage: String,
        kind: String,
        message: String,
    },
}

#[derive(Debug, Serialize)]
pub struct PipelineEventEntry {
    pub upload_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: PipelineEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Redact free text in the event and hand it to the tracing system.
    pub fn log_event(upload_id: &str, event: PipelineEvent) -> PipelineEventEntry {
        let event = match event {
            PipelineEvent::Recognized { provider, answer } => PipelineEvent::Recognized {
                provider,
                answer: redact_sensitive_data(&answer),
            },
            PipelineEvent::Failed {
                stage,
                kind,
                message,
            } => PipelineEvent::Failed {
                stage,
                kind,
                message: redact_sensitive_data(&message),
            },
            other => other,
        };

        let entry = PipelineEventEntry {
            upload_id: upload_id.into(),
            timestamp: Utc::now(),
            event,
        };

        info!(target: "pipeline_events", event = ?entry, "Pipeline event");
        entry
    }
}
