//! `POST /upload`: multipart image in, observation and running tally out.

use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use shelfcount_core::{PreprocessError, ShelfError, UploadedImage};
use shelfcount_pipeline::UploadOutcome;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::server::GatewayState;

/// Multipart field carrying the photo.
pub const IMAGE_FIELD: &str = "image";

pub async fn upload_image(
    State(state): State<GatewayState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadOutcome>> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        debug!(%filename, size = bytes.len(), "Received upload");
        upload = Some(UploadedImage::new(bytes.to_vec(), filename));
        break;
    }

    let upload =
        upload.ok_or_else(|| ApiError::from(ShelfError::from(PreprocessError::MissingFile)))?;
    let outcome = state.pipeline.process(upload).await?;
    Ok(Json(outcome))
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::bad_request(err.body_text())
    }
}
