//! OpenAI-compatible chat-completions adapter.
//!
//! Works against any endpoint speaking the `/chat/completions` schema
//! (OpenAI, OpenRouter, Groq, vLLM, Ollama). Every failure is classified
//! once into an [`ErrorCategory`] here; nothing above this module looks at
//! HTTP status codes or response bodies.

use async_trait::async_trait;
use council_application::{LlmClient, ProviderImplementation};
use council_domain::{
    ErrorCategory, GenerationResult, ModelParameters, ProviderError, SafetyRating, truncate,
};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::debug;

/// Default request timeout for a single generate call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Longest slice of an error body kept in `ProviderError::details`
const MAX_DETAIL_LEN: usize = 2000;

/// Chat completion response (only the fields we read).
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChatMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// API error envelope.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    #[serde(default)]
    code: Option<Value>,
}

/// Client factory bound to every OpenAI-compatible provider in the catalog
pub struct OpenAiCompatibleProvider {
    timeout: Duration,
}

impl OpenAiCompatibleProvider {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for OpenAiCompatibleProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderImplementation for OpenAiCompatibleProvider {
    async fn create_client(
        &self,
        api_key: &str,
        api_model_id: &str,
        base_url: Option<&str>,
    ) -> Result<Box<dyn LlmClient>, ProviderError> {
        let base_url = base_url.map(str::trim).filter(|u| !u.is_empty()).ok_or_else(|| {
            ProviderError::new(
                ErrorCategory::InvalidRequest,
                "provider has no base_url configured",
            )
        })?;

        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| {
                ProviderError::new(ErrorCategory::Unknown, "failed to build HTTP client")
                    .with_details(e.to_string())
            })?;

        Ok(Box::new(OpenAiCompatibleClient {
            http,
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: Some(api_key.to_string()).filter(|k| !k.is_empty()),
            model: api_model_id.to_string(),
        }))
    }
}

/// Client talking to one model on one endpoint
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatibleClient {
    fn headers(&self) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = &self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|_| {
                ProviderError::new(
                    ErrorCategory::Auth,
                    "API key contains characters not allowed in a header",
                )
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &ModelParameters,
    ) -> Result<GenerationResult, ProviderError> {
        let body = request_body(&self.model, prompt, params);
        debug!(model = %self.model, url = %self.url, "Sending chat completion");

        let response = self
            .http
            .post(&self.url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport_error)?;

        if !(200..300).contains(&status) {
            return Err(status_error(status, &text));
        }

        parse_response(&text)
    }
}

/// Build the request body: model, one user message, then the resolved
/// parameters flattened in. Parameters never override `model`/`messages`.
pub(crate) fn request_body(model: &str, prompt: &str, params: &ModelParameters) -> Value {
    let mut body = Map::new();
    body.insert("model".to_string(), json!(model));
    body.insert(
        "messages".to_string(),
        json!([{ "role": "user", "content": prompt }]),
    );
    for (name, value) in params {
        if name != "model" && name != "messages" {
            body.insert(name.clone(), value.clone());
        }
    }
    Value::Object(body)
}

/// Interpret a 2xx body as a raw generation result
pub(crate) fn parse_response(text: &str) -> Result<GenerationResult, ProviderError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(text).map_err(|e| {
        ProviderError::new(ErrorCategory::Unknown, "malformed chat completion response")
            .with_details(format!("{e}: {}", truncate(text, MAX_DETAIL_LEN)))
    })?;

    let Some(choice) = parsed.choices.into_iter().next() else {
        return Ok(GenerationResult::default());
    };

    let content = choice.message.and_then(|m| m.content).unwrap_or_default();
    let finish_reason = choice.finish_reason;
    let safety = match finish_reason.as_deref() {
        Some("content_filter") => vec![SafetyRating {
            category: "content_filter".to_string(),
            blocked: true,
            probability: None,
        }],
        _ => Vec::new(),
    };

    Ok(GenerationResult {
        truncated: finish_reason.as_deref() == Some("length"),
        content,
        finish_reason,
        safety,
    })
}

/// Classify a non-2xx response
pub(crate) fn status_error(status: u16, body: &str) -> ProviderError {
    let (message, code) = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api) => (api.error.message, api.error.code.map(|c| c.to_string())),
        Err(_) => (format!("HTTP {status}"), None),
    };

    let category = classify_status(status, &message, code.as_deref(), body);
    ProviderError::new(category, message)
        .with_details(format!("HTTP {status}: {}", truncate(body, MAX_DETAIL_LEN)))
}

pub(crate) fn classify_status(
    status: u16,
    message: &str,
    code: Option<&str>,
    body: &str,
) -> ErrorCategory {
    match status {
        401 | 403 => ErrorCategory::Auth,
        402 => ErrorCategory::InsufficientCredits,
        404 => ErrorCategory::NotFound,
        429 => ErrorCategory::RateLimit,
        400 | 413 | 422 => {
            let haystack = format!("{} {} {}", message, code.unwrap_or(""), body).to_lowercase();
            if is_context_length(&haystack) {
                ErrorCategory::InputLimit
            } else if is_content_filter(&haystack) {
                ErrorCategory::ContentFiltered
            } else {
                ErrorCategory::InvalidRequest
            }
        }
        400..=499 => ErrorCategory::InvalidRequest,
        500..=599 => ErrorCategory::Server,
        _ => ErrorCategory::Unknown,
    }
}

fn is_context_length(text: &str) -> bool {
    [
        "context_length_exceeded",
        "context length",
        "maximum context",
        "too many tokens",
        "token limit",
        "prompt is too long",
    ]
    .iter()
    .any(|needle| text.contains(needle))
}

fn is_content_filter(text: &str) -> bool {
    ["content_filter", "content_policy", "content management policy", "safety"]
        .iter()
        .any(|needle| text.contains(needle))
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    let message = if e.is_timeout() {
        "request timed out"
    } else if e.is_connect() {
        "connection failed"
    } else if e.is_decode() {
        "failed to read response body"
    } else {
        "request failed"
    };
    ProviderError::new(ErrorCategory::Network, message).with_details(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP response and return the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(split) = text.find("\r\n\r\n") {
                    let content_length = text[..split]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= split + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "{status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{addr}/v1"), handle)
    }

    async fn client_for(base_url: &str, api_key: &str) -> Box<dyn LlmClient> {
        OpenAiCompatibleProvider::new()
            .with_timeout(Duration::from_secs(5))
            .create_client(api_key, "gpt-test", Some(base_url))
            .await
            .unwrap()
    }

    #[test]
    fn test_classify_status_codes() {
        assert_eq!(classify_status(401, "", None, ""), ErrorCategory::Auth);
        assert_eq!(classify_status(403, "", None, ""), ErrorCategory::Auth);
        assert_eq!(
            classify_status(402, "", None, ""),
            ErrorCategory::InsufficientCredits
        );
        assert_eq!(classify_status(404, "", None, ""), ErrorCategory::NotFound);
        assert_eq!(classify_status(429, "", None, ""), ErrorCategory::RateLimit);
        assert_eq!(
            classify_status(409, "", None, ""),
            ErrorCategory::InvalidRequest
        );
        assert_eq!(classify_status(500, "", None, ""), ErrorCategory::Server);
        assert_eq!(classify_status(503, "", None, ""), ErrorCategory::Server);
    }

    #[test]
    fn test_classify_bad_request_wording() {
        assert_eq!(
            classify_status(
                400,
                "This model's maximum context length is 8192 tokens",
                Some("\"context_length_exceeded\""),
                ""
            ),
            ErrorCategory::InputLimit
        );
        assert_eq!(
            classify_status(
                400,
                "The response was filtered due to the prompt triggering content management policy",
                Some("\"content_filter\""),
                ""
            ),
            ErrorCategory::ContentFiltered
        );
        assert_eq!(
            classify_status(400, "Unrecognized request argument: foo", None, ""),
            ErrorCategory::InvalidRequest
        );
    }

    #[test]
    fn test_status_error_extracts_api_message() {
        let body = r#"{"error":{"message":"Rate limit reached","type":"requests","code":"rate_limit_exceeded"}}"#;
        let err = status_error(429, body);

        assert_eq!(err.category, ErrorCategory::RateLimit);
        assert_eq!(err.message, "Rate limit reached");
        assert!(err.details.unwrap().starts_with("HTTP 429"));
    }

    #[test]
    fn test_status_error_with_non_json_body() {
        let err = status_error(502, "<html>Bad Gateway</html>");
        assert_eq!(err.category, ErrorCategory::Server);
        assert_eq!(err.message, "HTTP 502");
    }

    #[test]
    fn test_request_body_flattens_parameters() {
        let mut params = ModelParameters::new();
        params.insert("temperature".to_string(), json!(0.2));
        params.insert("model".to_string(), json!("hijack"));

        let body = request_body("gpt-test", "Hello", &params);

        assert_eq!(body["model"], "gpt-test");
        assert_eq!(body["temperature"], 0.2);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hello");
    }

    #[test]
    fn test_parse_response_content_filter_is_blocked() {
        let result = parse_response(
            r#"{"choices":[{"message":{"content":null},"finish_reason":"content_filter"}]}"#,
        )
        .unwrap();

        assert!(result.content.is_empty());
        assert!(result.is_safety_blocked());
        assert!(result.safety[0].blocked);
    }

    #[test]
    fn test_parse_response_length_marks_truncated() {
        let result = parse_response(
            r#"{"choices":[{"message":{"content":"partial"},"finish_reason":"length"}]}"#,
        )
        .unwrap();

        assert_eq!(result.content, "partial");
        assert!(result.truncated);
        assert!(!result.is_safety_blocked());
    }

    #[test]
    fn test_parse_response_without_choices_is_empty() {
        let result = parse_response(r#"{"choices":[]}"#).unwrap();
        assert!(!result.has_content());
    }

    #[test]
    fn test_parse_response_malformed() {
        let err = parse_response("not json").unwrap_err();
        assert_eq!(err.category, ErrorCategory::Unknown);
    }

    #[tokio::test]
    async fn test_create_client_requires_base_url() {
        let result = OpenAiCompatibleProvider::new()
            .create_client("key", "gpt-test", None)
            .await;

        match result {
            Err(e) => assert_eq!(e.category, ErrorCategory::InvalidRequest),
            Ok(_) => panic!("expected an error without base_url"),
        }
    }

    #[tokio::test]
    async fn test_generate_success_round_trip() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"Hi there"},"finish_reason":"stop"}]}"#,
        )
        .await;
        let client = client_for(&base_url, "sk-test").await;

        let result = client.generate("Hello", &ModelParameters::new()).await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(result.content, "Hi there");
        assert_eq!(result.finish_reason.as_deref(), Some("stop"));
        assert!(request.starts_with("POST /v1/chat/completions"));
        assert!(request.to_lowercase().contains("authorization: bearer sk-test"));
        assert!(request.contains("\"model\":\"gpt-test\""));
    }

    #[tokio::test]
    async fn test_generate_omits_auth_header_without_key() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"choices":[{"message":{"content":"ok"},"finish_reason":"stop"}]}"#,
        )
        .await;
        let client = client_for(&base_url, "").await;

        client.generate("Hello", &ModelParameters::new()).await.unwrap();
        let request = server.await.unwrap();

        assert!(!request.to_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn test_generate_classifies_rate_limit() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 429 Too Many Requests",
            r#"{"error":{"message":"slow down"}}"#,
        )
        .await;
        let client = client_for(&base_url, "sk-test").await;

        let err = client
            .generate("Hello", &ModelParameters::new())
            .await
            .unwrap_err();
        server.await.unwrap();

        assert_eq!(err.category, ErrorCategory::RateLimit);
        assert_eq!(err.message, "slow down");
    }

    #[tokio::test]
    async fn test_generate_connection_refused_is_network() {
        // Bind then drop to get a port nobody listens on
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let client = client_for(&format!("http://{addr}/v1"), "sk-test").await;

        let err = client
            .generate("Hello", &ModelParameters::new())
            .await
            .unwrap_err();

        assert_eq!(err.category, ErrorCategory::Network);
    }
}
