//! Text and image generation services.
//!
//! [`ModelProviderClient`] is the seam between the agent client and a concrete text
//! service (OpenAI, Anthropic, Ollama, any OpenAI-compatible server). Streaming calls
//! hand back the raw response body; frame decoding lives in [`crate::stream`].

use crate::error::ApiError;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::pin::Pin;
use std::time::Duration;

pub mod image;
pub mod profile;

pub use image::{ImageProviderClient, ImageRequest, ImageSize, OpenAIImageClient};
pub use profile::{ProviderConfig, ProviderType};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434";
const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 1024;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Whole-response bound for non-streaming calls. Streams are bounded per read by the aggregator.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// A resolved text service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelProvider {
    OpenAI {
        model: String,
        api_key: String,
        base_url: Option<String>,
    },
    Anthropic {
        model: String,
        api_key: String,
    },
    Ollama {
        model: String,
        base_url: Option<String>,
    },
    LocalCustom {
        model: String,
        endpoint: String,
        api_key: Option<String>,
    },
}

impl ModelProvider {
    /// Build the client that talks to this service.
    pub fn connect(&self) -> Result<Box<dyn ModelProviderClient>, ApiError> {
        let client: Box<dyn ModelProviderClient> = match self.clone() {
            ModelProvider::OpenAI {
                model,
                api_key,
                base_url,
            } => {
                let base = base_url.unwrap_or_else(|| OPENAI_BASE_URL.to_string());
                Box::new(ChatCompletionsClient::new("openai", model, Some(api_key), &base)?)
            }
            ModelProvider::Anthropic { model, api_key } => {
                Box::new(AnthropicClient::new(model, api_key)?)
            }
            ModelProvider::Ollama { model, base_url } => {
                let base = base_url.unwrap_or_else(|| OLLAMA_BASE_URL.to_string());
                let base = format!("{}/v1", base.trim_end_matches('/'));
                Box::new(ChatCompletionsClient::new("ollama", model, None, &base)?)
            }
            ModelProvider::LocalCustom {
                model,
                endpoint,
                api_key,
            } => Box::new(ChatCompletionsClient::new("local", model, api_key, &endpoint)?),
        };
        Ok(client)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
}

impl MessageRole {
    fn as_str(self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Per-call knobs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Ask the service for a JSON object where it supports that.
    #[serde(default)]
    pub json_output: bool,
}

/// One finished completion
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub model: String,
    pub output_tokens: Option<u32>,
}

/// Raw streamed response body, chunked as the network delivers it.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, ApiError>> + Send>>;

#[async_trait]
pub trait ModelProviderClient: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<Completion, ApiError>;

    /// Open a streaming completion. The returned body is a server-sent event stream.
    async fn stream(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<ByteStream, ApiError>;

    fn provider_name(&self) -> &str;
}

pub(crate) fn map_http_error(error: reqwest::Error) -> ApiError {
    if let Some(status) = error.status() {
        status_error(status.as_u16(), error.to_string())
    } else if error.is_timeout() {
        ApiError::ProviderRequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ApiError::ProviderRequestFailed(format!("Connection error: {}", error))
    } else {
        ApiError::ProviderError(format!("HTTP error: {}", error))
    }
}

pub(crate) fn status_error(status: u16, message: String) -> ApiError {
    match status {
        401 => ApiError::ProviderAuthFailed(format!("Authentication failed: {}", message)),
        429 => ApiError::ProviderRateLimit(format!("Rate limit exceeded: {}", message)),
        404 => ApiError::ProviderModelNotFound(format!("Model not found: {}", message)),
        _ => ApiError::ProviderStatus { status, message },
    }
}

/// Send a request and turn any non-2xx answer into the matching status error.
pub(crate) async fn send_checked(request: RequestBuilder) -> Result<Response, ApiError> {
    let response = request.send().await.map_err(map_http_error)?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(status_error(status.as_u16(), body))
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json()
        .await
        .map_err(|e| ApiError::ProviderError(format!("Failed to parse response: {}", e)))
}

fn into_byte_stream(response: Response) -> ByteStream {
    Box::pin(
        response
            .bytes_stream()
            .map_ok(|chunk| chunk.to_vec())
            .map_err(map_http_error),
    )
}

pub(crate) fn build_provider_http_client() -> Result<Client, ApiError> {
    build_http_client(Some(REQUEST_TIMEOUT))
}

/// No total timeout: a streamed body may legitimately stay open for minutes.
pub(crate) fn build_streaming_http_client() -> Result<Client, ApiError> {
    build_http_client(None)
}

fn build_http_client(total: Option<Duration>) -> Result<Client, ApiError> {
    let mut builder = Client::builder().connect_timeout(CONNECT_TIMEOUT);
    if let Some(total) = total {
        builder = builder.timeout(total);
    }
    builder
        .build()
        .map_err(|e| ApiError::ProviderError(format!("Failed to create HTTP client: {}", e)))
}

/// HTTP clients for one provider: bounded for completions, unbounded for streams.
struct HttpClients {
    complete: Client,
    stream: Client,
}

impl HttpClients {
    fn new() -> Result<Self, ApiError> {
        Ok(Self {
            complete: build_provider_http_client()?,
            stream: build_streaming_http_client()?,
        })
    }

    fn for_call(&self, stream: bool) -> &Client {
        if stream {
            &self.stream
        } else {
            &self.complete
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletionsResponse {
    model: String,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    completion_tokens: u32,
}

/// Client for every OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionsClient {
    http: HttpClients,
    provider_name: &'static str,
    model: String,
    api_key: Option<String>,
    chat_url: String,
}

impl ChatCompletionsClient {
    pub fn new(
        provider_name: &'static str,
        model: String,
        api_key: Option<String>,
        base_url: &str,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            http: HttpClients::new()?,
            provider_name,
            model,
            api_key,
            chat_url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        })
    }

    fn body(&self, messages: Vec<ChatMessage>, options: &CompletionOptions, stream: bool) -> Value {
        let messages: Vec<Value> = messages
            .into_iter()
            .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
            .collect();
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "stream": stream,
        });
        if let Some(temperature) = options.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if options.json_output {
            body["response_format"] = json!({"type": "json_object"});
        }
        body
    }

    fn request(
        &self,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
        stream: bool,
    ) -> RequestBuilder {
        let mut builder = self
            .http
            .for_call(stream)
            .post(&self.chat_url)
            .header("Content-Type", "application/json");
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }
        builder.json(&self.body(messages, options, stream))
    }
}

#[async_trait]
impl ModelProviderClient for ChatCompletionsClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<Completion, ApiError> {
        let response = send_checked(self.request(messages, &options, false)).await?;
        let completion: ChatCompletionsResponse = read_json(response).await?;
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::ProviderError("No choices in response".to_string()))?;
        Ok(Completion {
            content: choice.message.content.unwrap_or_default(),
            model: completion.model,
            output_tokens: completion.usage.map(|u| u.completion_tokens),
        })
    }

    async fn stream(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<ByteStream, ApiError> {
        let response = send_checked(self.request(messages, &options, true)).await?;
        Ok(into_byte_stream(response))
    }

    fn provider_name(&self) -> &str {
        self.provider_name
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    model: String,
    #[serde(default)]
    content: Vec<MessagesContent>,
    usage: Option<MessagesUsage>,
}

#[derive(Deserialize)]
struct MessagesContent {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct MessagesUsage {
    output_tokens: u32,
}

/// Anthropic messages API client
pub struct AnthropicClient {
    http: HttpClients,
    model: String,
    api_key: String,
}

impl AnthropicClient {
    pub fn new(model: String, api_key: String) -> Result<Self, ApiError> {
        Ok(Self {
            http: HttpClients::new()?,
            model,
            api_key,
        })
    }

    /// System messages travel in their own field; the API has no JSON mode switch.
    fn body(&self, messages: Vec<ChatMessage>, options: &CompletionOptions, stream: bool) -> Value {
        let (system, turns): (Vec<ChatMessage>, Vec<ChatMessage>) = messages
            .into_iter()
            .partition(|m| m.role == MessageRole::System);
        let turns: Vec<Value> = turns
            .into_iter()
            .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
            .collect();

        let mut body = json!({
            "model": self.model,
            "max_tokens": options.max_tokens.unwrap_or(ANTHROPIC_DEFAULT_MAX_TOKENS),
            "messages": turns,
            "stream": stream,
        });
        if !system.is_empty() {
            let system: Vec<String> = system.into_iter().map(|m| m.content).collect();
            body["system"] = json!(system.join("\n\n"));
        }
        if let Some(temperature) = options.temperature {
            // 0.0-1.0 only
            body["temperature"] = json!(temperature.min(1.0));
        }
        body
    }

    fn request(
        &self,
        messages: Vec<ChatMessage>,
        options: &CompletionOptions,
        stream: bool,
    ) -> RequestBuilder {
        self.http
            .for_call(stream)
            .post(ANTHROPIC_MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&self.body(messages, options, stream))
    }
}

#[async_trait]
impl ModelProviderClient for AnthropicClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<Completion, ApiError> {
        let response = send_checked(self.request(messages, &options, false)).await?;
        let completion: MessagesResponse = read_json(response).await?;
        let content: String = completion.content.into_iter().map(|c| c.text).collect();
        Ok(Completion {
            content,
            model: completion.model,
            output_tokens: completion.usage.map(|u| u.output_tokens),
        })
    }

    async fn stream(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<ByteStream, ApiError> {
        let response = send_checked(self.request(messages, &options, true)).await?;
        Ok(into_byte_stream(response))
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

/// Scripted provider for unit tests: serves responses in order, then times out.
#[cfg(test)]
pub(crate) struct MockProvider {
    responses: parking_lot::Mutex<std::collections::VecDeque<Result<String, ApiError>>>,
    chunks: Vec<Vec<u8>>,
    stall_after_chunks: bool,
}

#[cfg(test)]
impl MockProvider {
    pub(crate) fn new(responses: Vec<Result<String, ApiError>>) -> Self {
        Self {
            responses: parking_lot::Mutex::new(responses.into()),
            chunks: Vec::new(),
            stall_after_chunks: false,
        }
    }

    pub(crate) fn streaming(chunks: Vec<&str>) -> Self {
        Self {
            responses: parking_lot::Mutex::new(Default::default()),
            chunks: chunks.into_iter().map(|c| c.as_bytes().to_vec()).collect(),
            stall_after_chunks: false,
        }
    }

    /// Serves `chunks`, then keeps the connection open without sending anything.
    pub(crate) fn stalling(chunks: Vec<&str>) -> Self {
        Self {
            stall_after_chunks: true,
            ..Self::streaming(chunks)
        }
    }
}

#[cfg(test)]
#[async_trait]
impl ModelProviderClient for MockProvider {
    async fn complete(
        &self,
        _messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<Completion, ApiError> {
        let next = self.responses.lock().pop_front().unwrap_or_else(|| {
            Err(ApiError::ProviderRequestFailed(
                "Request timeout: mock exhausted".to_string(),
            ))
        });
        next.map(|content| Completion {
            content,
            model: "mock-model".to_string(),
            output_tokens: None,
        })
    }

    async fn stream(
        &self,
        _messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<ByteStream, ApiError> {
        use futures::StreamExt;
        let chunks: Vec<Result<Vec<u8>, ApiError>> =
            self.chunks.iter().cloned().map(Ok).collect();
        let served = futures::stream::iter(chunks);
        if self.stall_after_chunks {
            Ok(Box::pin(served.chain(futures::stream::pending())))
        } else {
            Ok(Box::pin(served))
        }
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
