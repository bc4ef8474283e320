//! Upload processing: raw bytes → normalized JPEG → recognition answer →
//! observation → running tally.
//!
//! Each stage fails fast with its own error variant. Nothing is written to the
//! store unless the answer parsed.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use shelfcount_core::{
    AggregateRecord, NormalizedImage, Observation, RecognitionProvider, ShelfError, UploadedImage,
};
use shelfcount_logging::{EventLogger, PipelineEvent};
use shelfcount_media::ImagePreprocessor;
use shelfcount_store::TallyStore;
use shelfcount_understanding::parse_answer;

/// Result of one successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadOutcome {
    #[serde(flatten)]
    pub observation: Observation,
    /// The tally after this observation was merged in.
    pub record: AggregateRecord,
}

pub struct UploadPipeline {
    preprocessor: ImagePreprocessor,
    recognizer: Arc<dyn RecognitionProvider>,
    store: Arc<dyn TallyStore>,
}

impl UploadPipeline {
    pub fn new(
        preprocessor: ImagePreprocessor,
        recognizer: Arc<dyn RecognitionProvider>,
        store: Arc<dyn TallyStore>,
    ) -> Self {
        Self {
            preprocessor,
            recognizer,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn TallyStore> {
        &self.store
    }

    /// Run one upload through every stage.
    pub async fn process(&self, upload: UploadedImage) -> Result<UploadOutcome, ShelfError> {
        let upload_id = Uuid::new_v4().to_string();
        let span = info_span!("upload", %upload_id, filename = %upload.filename);
        self.run(&upload_id, upload)
            .instrument(span)
            .await
            .inspect_err(|err| {
                EventLogger::log_event(
                    &upload_id,
                    PipelineEvent::Failed {
                        stage: stage_of(err).to_string(),
                        kind: err.kind().to_string(),
                        message: err.to_string(),
                    },
                );
            })
    }

    /// Merge an observation that did not come from an image.
    pub async fn observe(&self, observation: &Observation) -> Result<AggregateRecord, ShelfError> {
        let record = self
            .store
            .upsert(&observation.object_name, observation.count)
            .await?;
        info!(id = record.id, object_name = %record.object_name, total = record.count, "Observation recorded");
        Ok(record)
    }

    async fn run(&self, upload_id: &str, upload: UploadedImage) -> Result<UploadOutcome, ShelfError> {
        let filename = upload.filename.clone();
        let image = self.normalize(upload).await?;
        EventLogger::log_event(
            upload_id,
            PipelineEvent::Normalized {
                filename,
                before_bytes: image.original_size,
                after_bytes: image.jpeg.len(),
                width: image.width,
                height: image.height,
            },
        );

        let answer = self.recognizer.recognize(&image).await?;
        EventLogger::log_event(
            upload_id,
            PipelineEvent::Recognized {
                provider: self.recognizer.name().to_string(),
                answer: answer.as_str().to_string(),
            },
        );

        let observation = parse_answer(answer.as_str())?;
        let record = self.observe(&observation).await?;
        EventLogger::log_event(
            upload_id,
            PipelineEvent::Tallied {
                record_id: record.id,
                object_name: record.object_name.clone(),
                added: observation.count,
                total: record.count,
            },
        );

        Ok(UploadOutcome { observation, record })
    }

    /// Decode/resize/encode is CPU-bound; keep it off the async workers.
    async fn normalize(&self, upload: UploadedImage) -> Result<NormalizedImage, ShelfError> {
        let preprocessor = self.preprocessor;
        let normalized = tokio::task::spawn_blocking(move || {
            preprocessor.normalize(&upload.bytes, &upload.filename)
        })
        .await
        .map_err(|e| ShelfError::Internal(format!("normalize task failed: {e}")))??;
        Ok(normalized)
    }
}

fn stage_of(err: &ShelfError) -> &'static str {
    match err {
        ShelfError::Preprocess(_) => "normalize",
        ShelfError::Recognition(_) => "recognize",
        ShelfError::Parse(_) => "parse",
        ShelfError::Store(_) => "tally",
        ShelfError::Internal(_) => "internal",
    }
}
