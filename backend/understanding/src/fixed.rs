//! A recognizer that never leaves the process.
//!
//! Used for offline scans and to drive the pipeline in tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use shelfcount_core::{NormalizedImage, RecognitionAnswer, RecognitionError, RecognitionProvider};

enum Outcome {
    Answer(String),
    Unavailable(String),
    Protocol(String),
}

/// Returns the same canned outcome for every image.
pub struct FixedRecognizer {
    outcome: Outcome,
    calls: AtomicUsize,
}

impl FixedRecognizer {
    pub fn answer(text: impl Into<String>) -> Self {
        Self::with(Outcome::Answer(text.into()))
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::with(Outcome::Unavailable(message.into()))
    }

    pub fn protocol_error(message: impl Into<String>) -> Self {
        Self::with(Outcome::Protocol(message.into()))
    }

    fn with(outcome: Outcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of images submitted so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecognitionProvider for FixedRecognizer {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn recognize(
        &self,
        _image: &NormalizedImage,
    ) -> Result<RecognitionAnswer, RecognitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Outcome::Answer(text) => Ok(RecognitionAnswer::new(text.clone())),
            Outcome::Unavailable(msg) => Err(RecognitionError::Unavailable(msg.clone())),
            Outcome::Protocol(msg) => Err(RecognitionError::Protocol(msg.clone())),
        }
    }
}
