use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use image::{DynamicImage, ImageFormat, RgbImage};
use shelfcount_media::ImagePreprocessor;
use shelfcount_pipeline::UploadPipeline;
use shelfcount_store::InMemoryTallyStore;
use shelfcount_understanding::FixedRecognizer;
use tower::ServiceExt;

use crate::server::{build_router, GatewayState};

const BOUNDARY: &str = "shelfcount-test-boundary";

pub fn router(recognizer: Arc<FixedRecognizer>) -> (Router, Arc<InMemoryTallyStore>) {
    router_with_limit(recognizer, 16 * 1024 * 1024)
}

pub fn router_with_limit(
    recognizer: Arc<FixedRecognizer>,
    limit: usize,
) -> (Router, Arc<InMemoryTallyStore>) {
    let store = Arc::new(InMemoryTallyStore::new());
    let pipeline = UploadPipeline::new(ImagePreprocessor::default(), recognizer, store.clone());
    let state = GatewayState::new(Arc::new(pipeline));
    (build_router(state, limit), store)
}

pub fn png(w: u32, h: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(w, h))
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

pub fn multipart_request(field: &str, filename: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

pub async fn read_json(res: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
