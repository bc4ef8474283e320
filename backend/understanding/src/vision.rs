/// Vision recognition via an OpenAI-compatible chat-completions endpoint.
///
/// One request per image, no retries. Transport trouble surfaces as
/// `RecognitionError::Unavailable`; anything the service returns that does not
/// match the response schema surfaces as `RecognitionError::Protocol`.
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use shelfcount_core::{NormalizedImage, RecognitionAnswer, RecognitionError, RecognitionProvider};

/// The single instruction sent with every image.
pub const RECOGNITION_PROMPT: &str = "Identify the single primary object in this image, the one \
closest to the center. Reply with only how many of that object you can see and its common name, \
formatted exactly as \"<integer>, <name>\", for example \"2, Banana\". Do not add any other text.";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_MAX_TOKENS: u32 = 300;
pub const DEFAULT_DETAIL: &str = "low";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection and request settings for the recognition service.
#[derive(Debug, Clone)]
pub struct RecognitionConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Image detail level; "low" bounds cost and latency.
    pub detail: String,
    pub timeout: Duration,
}

impl RecognitionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            detail: DEFAULT_DETAIL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// OpenAI-compatible vision client.
pub struct OpenAiVisionClient {
    client: Client,
    config: RecognitionConfig,
}

impl OpenAiVisionClient {
    pub fn new(config: RecognitionConfig) -> Result<Self, RecognitionError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RecognitionError::Unavailable(format!("http client init: {e}")))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, image: &NormalizedImage) -> ChatRequest {
        let data_url = format!("data:{};base64,{}", image.mime_type(), STANDARD.encode(&image.jpeg));
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![UserMessage {
                role: "user",
                content: vec![
                    ContentPart::Text {
                        text: RECOGNITION_PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: data_url,
                            detail: self.config.detail.clone(),
                        },
                    },
                ],
            }],
            max_tokens: self.config.max_tokens,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<UserMessage>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct UserMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
    detail: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Pull the answer text out of a response body, enforcing the schema.
fn extract_answer(body: &[u8]) -> Result<String, RecognitionError> {
    let parsed: ChatResponse = serde_json::from_slice(body)
        .map_err(|e| RecognitionError::Protocol(format!("unexpected response shape: {e}")))?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| RecognitionError::Protocol("response has no choices".into()))?;
    match choice.message.content {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(RecognitionError::Protocol("response message has no text content".into())),
    }
}

fn transport_error(e: reqwest::Error) -> RecognitionError {
    if e.is_timeout() {
        RecognitionError::Unavailable(format!("request timed out: {e}"))
    } else {
        RecognitionError::Unavailable(e.to_string())
    }
}

#[async_trait]
impl RecognitionProvider for OpenAiVisionClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn recognize(
        &self,
        image: &NormalizedImage,
    ) -> Result<RecognitionAnswer, RecognitionError> {
        let start = Instant::now();
        let body = self.build_request(image);
        debug!(
            model = %self.config.model,
            image_bytes = image.jpeg.len(),
            "Sending image to recognition service"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            let detail = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]).into_owned();
            warn!(%status, "Recognition service returned an error status");
            return Err(
                if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    RecognitionError::Unavailable(format!("service returned {status}: {detail}"))
                } else {
                    RecognitionError::Protocol(format!("service returned {status}: {detail}"))
                },
            );
        }

        let answer = extract_answer(&bytes)?;
        info!(
            latency_ms = start.elapsed().as_millis() as u64,
            "Recognition answer received"
        );
        Ok(RecognitionAnswer::new(answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode as AxumStatus},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    #[derive(Clone)]
    struct MockState {
        status: AxumStatus,
        reply: Value,
        delay: Duration,
        seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    }

    async fn mock_chat_completions(
        State(state): State<MockState>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (AxumStatus, Json<Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        state.seen.lock().unwrap().push((auth, body));
        tokio::time::sleep(state.delay).await;
        (state.status, Json(state.reply.clone()))
    }

    /// Start a mock OpenAI-compatible server; returns its base URL and the request log.
    async fn spawn_mock(
        status: AxumStatus,
        reply: Value,
        delay: Duration,
    ) -> (String, Arc<Mutex<Vec<(Option<String>, Value)>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            status,
            reply,
            delay,
            seen: seen.clone(),
        };
        let app = Router::new()
            .route("/v1/chat/completions", post(mock_chat_completions))
            .with_state(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/v1"), seen)
    }

    fn completion(content: Value) -> Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
        })
    }

    fn image() -> NormalizedImage {
        NormalizedImage {
            jpeg: vec![0xFF, 0xD8, 0xFF, 0xD9],
            width: 1,
            height: 1,
            original_size: 4,
        }
    }

    fn client(base_url: &str) -> OpenAiVisionClient {
        OpenAiVisionClient::new(RecognitionConfig::new("sk-test").with_base_url(base_url)).unwrap()
    }

    #[tokio::test]
    async fn test_returns_answer_verbatim_and_sends_single_turn() {
        let (url, seen) =
            spawn_mock(AxumStatus::OK, completion(json!(" 2, Banana ")), Duration::ZERO).await;

        let answer = client(&url).recognize(&image()).await.unwrap();
        assert_eq!(answer.as_str(), " 2, Banana ");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (auth, body) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["max_tokens"], 300);

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        let parts = messages[0]["content"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[0]["text"], RECOGNITION_PROMPT);
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["detail"], "low");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/jpeg;base64,/9j/2Q==");
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_protocol_error() {
        for reply in [
            json!({ "error": "nope" }),
            json!({ "choices": [] }),
            completion(Value::Null),
            completion(json!("   ")),
            json!({ "choices": [{ "message": { "content": 42 } }] }),
        ] {
            let (url, _) = spawn_mock(AxumStatus::OK, reply.clone(), Duration::ZERO).await;
            let err = client(&url).recognize(&image()).await.unwrap_err();
            assert!(matches!(err, RecognitionError::Protocol(_)), "{reply}: {err}");
        }
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let (url, _) =
            spawn_mock(AxumStatus::SERVICE_UNAVAILABLE, json!({}), Duration::ZERO).await;
        let err = client(&url).recognize(&image()).await.unwrap_err();
        assert!(matches!(err, RecognitionError::Unavailable(_)));

        let (url, _) = spawn_mock(AxumStatus::TOO_MANY_REQUESTS, json!({}), Duration::ZERO).await;
        let err = client(&url).recognize(&image()).await.unwrap_err();
        assert!(matches!(err, RecognitionError::Unavailable(_)));

        let (url, _) = spawn_mock(
            AxumStatus::BAD_REQUEST,
            json!({ "error": { "message": "bad image" } }),
            Duration::ZERO,
        )
        .await;
        let err = client(&url).recognize(&image()).await.unwrap_err();
        assert!(matches!(err, RecognitionError::Protocol(ref m) if m.contains("bad image")));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{addr}/v1"))
            .recognize(&image())
            .await
            .unwrap_err();
        assert!(matches!(err, RecognitionError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable_and_not_retried() {
        let (url, seen) = spawn_mock(
            AxumStatus::OK,
            completion(json!("1, Apple")),
            Duration::from_secs(2),
        )
        .await;
        let client = OpenAiVisionClient::new(
            RecognitionConfig::new("sk-test")
                .with_base_url(url)
                .with_timeout(Duration::from_millis(200)),
        )
        .unwrap();

        let err = client.recognize(&image()).await.unwrap_err();
        assert!(matches!(err, RecognitionError::Unavailable(_)));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
