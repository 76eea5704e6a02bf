//! Image generation providers.
//!
//! Image services accept a prompt, a size and a count and answer with zero or more
//! image locations. Inline base64 payloads are turned into `data:` URLs so callers
//! only ever see locations.

use crate::error::ApiError;
use crate::provider::{build_provider_http_client, send_checked};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Desired aspect of a generated image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSize {
    #[default]
    Square,
    Landscape,
    Portrait,
}

impl ImageSize {
    pub fn as_dimensions(self) -> &'static str {
        match self {
            ImageSize::Square => "1024x1024",
            ImageSize::Landscape => "1792x1024",
            ImageSize::Portrait => "1024x1792",
        }
    }
}

/// One image generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub prompt: String,
    pub size: ImageSize,
    pub count: u8,
}

impl ImageRequest {
    pub fn single(prompt: impl Into<String>, size: ImageSize) -> Self {
        Self {
            prompt: prompt.into(),
            size,
            count: 1,
        }
    }
}

#[async_trait]
pub trait ImageProviderClient: Send + Sync {
    /// Generate images, returning their locations in service order.
    async fn generate(&self, request: &ImageRequest) -> Result<Vec<String>, ApiError>;

    fn provider_name(&self) -> &str;
}

#[derive(Serialize)]
struct ImageGenerationBody<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'static str,
}

#[derive(Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    url: Option<String>,
    b64_json: Option<String>,
}

impl ImageDatum {
    fn into_location(self) -> Option<String> {
        match (self.url, self.b64_json) {
            (Some(url), _) if !url.trim().is_empty() => Some(url),
            (_, Some(b64)) if !b64.is_empty() => Some(format!("data:image/png;base64,{}", b64)),
            _ => None,
        }
    }
}

/// OpenAI-compatible `/images/generations` client
pub struct OpenAIImageClient {
    client: Client,
    model: String,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAIImageClient {
    pub fn new(
        model: String,
        api_key: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_provider_http_client()?,
            model,
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
        })
    }
}

#[async_trait]
impl ImageProviderClient for OpenAIImageClient {
    async fn generate(&self, request: &ImageRequest) -> Result<Vec<String>, ApiError> {
        let body = ImageGenerationBody {
            model: &self.model,
            prompt: &request.prompt,
            n: request.count.max(1),
            size: request.size.as_dimensions(),
        };

        let url = format!("{}/images/generations", self.base_url);
        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = send_checked(builder.json(&body)).await?;
        let parsed: ImageGenerationResponse = response.json().await.map_err(|e| {
            ApiError::ProviderError(format!("Failed to parse image response: {}", e))
        })?;

        Ok(parsed
            .data
            .into_iter()
            .filter_map(ImageDatum::into_location)
            .collect())
    }

    fn provider_name(&self) -> &str {
        "openai-images"
    }
}

/// Image provider for unit tests: fails for prompts containing `fail_on`.
#[cfg(test)]
pub(crate) struct MockImageProvider {
    pub(crate) fail_on: Option<String>,
    pub(crate) prompts: parking_lot::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockImageProvider {
    pub(crate) fn new(fail_on: Option<&str>) -> Self {
        Self {
            fail_on: fail_on.map(str::to_string),
            prompts: parking_lot::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl ImageProviderClient for MockImageProvider {
    async fn generate(&self, request: &ImageRequest) -> Result<Vec<String>, ApiError> {
        let mut prompts = self.prompts.lock();
        prompts.push(request.prompt.clone());
        if let Some(marker) = &self.fail_on {
            if request.prompt.contains(marker.as_str()) {
                return Err(ApiError::ProviderStatus {
                    status: 500,
                    message: "image backend down".to_string(),
                });
            }
        }
        Ok(vec![format!("https://img.test/{}.png", prompts.len())])
    }

    fn provider_name(&self) -> &str {
        "mock-images"
    }
}
