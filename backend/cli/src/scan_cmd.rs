//! `shelfcount scan`: run one local image through the full pipeline.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use shelfcount_core::{RecognitionProvider, UploadedImage};
use shelfcount_media::ImagePreprocessor;
use shelfcount_pipeline::{UploadOutcome, UploadPipeline};
use shelfcount_store::SqliteTallyStore;
use shelfcount_understanding::{FixedRecognizer, OpenAiVisionClient};

use crate::config::Settings;

/// `answer` replaces the remote model with a canned reply.
pub async fn run(settings: &Settings, file: &Path, answer: Option<String>) -> Result<UploadOutcome> {
    let recognizer: Arc<dyn RecognitionProvider> = match answer {
        Some(text) => Arc::new(FixedRecognizer::answer(text)),
        None => Arc::new(OpenAiVisionClient::new(settings.recognition_config()?)?),
    };
    let store = Arc::new(
        SqliteTallyStore::open(&settings.db_path)
            .with_context(|| format!("Failed to open database {}", settings.db_path))?,
    );
    let pipeline = UploadPipeline::new(
        ImagePreprocessor::new(settings.preprocess_config()),
        recognizer,
        store,
    );

    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(pipeline.process(UploadedImage::new(bytes, filename)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelfcount_config::schema::StoreConfig;
    use shelfcount_config::{apply_all_defaults, ShelfConfig};

    fn png() -> Vec<u8> {
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(image::RgbImage::new(16, 12))
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn settings(db: &Path) -> Settings {
        let mut config = apply_all_defaults(ShelfConfig::default());
        config.store = Some(StoreConfig {
            db_path: Some(db.display().to_string()),
        });
        Settings::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn scan_with_fixed_answer_accumulates_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("shelf.png");
        std::fs::write(&image, png()).unwrap();
        let settings = settings(&dir.path().join("results.db"));

        let first = run(&settings, &image, Some("2, Banana".into())).await.unwrap();
        let second = run(&settings, &image, Some("3, Banana".into())).await.unwrap();
        assert_eq!(first.record.id, second.record.id);
        assert_eq!(second.record.count, 5);
    }

    #[tokio::test]
    async fn scan_without_key_or_answer_fails() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("shelf.png");
        std::fs::write(&image, png()).unwrap();
        let settings = Settings {
            api_key: None,
            ..settings(&dir.path().join("results.db"))
        };
        assert!(run(&settings, &image, None).await.is_err());
    }
}
