use async_trait::async_trait;

use crate::error::RecognitionError;
use crate::types::{NormalizedImage, RecognitionAnswer};

/// An external service that answers "how many of what" for an image.
#[async_trait]
pub trait RecognitionProvider: Send + Sync {
    /// Provider name (e.g., "openai", "fixed").
    fn name(&self) -> &str;

    /// Submit one image and return the service's answer verbatim.
    async fn recognize(&self, image: &NormalizedImage)
        -> Result<RecognitionAnswer, RecognitionError>;
}
