//! Agent client: one outbound call, classified into a raw response.
//!
//! Every failure mode of a provider call is folded into the returned
//! [`RawAgentResponse`]; nothing here returns an error to the caller.

use crate::agent::request::GenerationRequest;
use crate::error::FailureReason;
use crate::provider::{ByteStream, ImageProviderClient, ImageRequest, ModelProviderClient};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Payload of an agent call
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Text(String),
    Images(Vec<String>),
}

/// What came back from one agent call. Consumed once by a coercer.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAgentResponse {
    pub payload: Payload,
    pub success: bool,
    pub failure: Option<FailureReason>,
}

impl RawAgentResponse {
    /// Text payloads that are blank after trimming count as empty.
    pub fn text(text: String) -> Self {
        if text.trim().is_empty() {
            return Self::failed(FailureReason::EmptyPayload);
        }
        Self {
            payload: Payload::Text(text),
            success: true,
            failure: None,
        }
    }

    pub fn images(locations: Vec<String>) -> Self {
        if locations.is_empty() {
            return Self::failed(FailureReason::EmptyPayload);
        }
        Self {
            payload: Payload::Images(locations),
            success: true,
            failure: None,
        }
    }

    pub fn failed(reason: FailureReason) -> Self {
        Self {
            payload: Payload::Empty,
            success: false,
            failure: Some(reason),
        }
    }

    fn failure_or_empty(self) -> FailureReason {
        self.failure.unwrap_or(FailureReason::EmptyPayload)
    }

    pub fn into_text(self) -> Result<String, FailureReason> {
        match self.payload {
            Payload::Text(text) if self.success => Ok(text),
            _ => Err(self.failure_or_empty()),
        }
    }

    pub fn into_images(self) -> Result<Vec<String>, FailureReason> {
        match self.payload {
            Payload::Images(locations) if self.success => Ok(locations),
            _ => Err(self.failure_or_empty()),
        }
    }
}

/// Handles to the text and image services. Either may be absent.
#[derive(Clone, Default)]
pub struct AgentClient {
    text: Option<Arc<dyn ModelProviderClient>>,
    image: Option<Arc<dyn ImageProviderClient>>,
}

impl AgentClient {
    pub fn new(
        text: Option<Arc<dyn ModelProviderClient>>,
        image: Option<Arc<dyn ImageProviderClient>>,
    ) -> Self {
        Self { text, image }
    }

    /// A client with no services; every call reports `ServiceNotConfigured`.
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, text: Arc<dyn ModelProviderClient>) -> Self {
        self.text = Some(text);
        self
    }

    pub fn with_image(mut self, image: Arc<dyn ImageProviderClient>) -> Self {
        self.image = Some(image);
        self
    }

    pub fn has_text_service(&self) -> bool {
        self.text.is_some()
    }

    pub fn has_image_service(&self) -> bool {
        self.image.is_some()
    }

    pub async fn generate_text(&self, request: &GenerationRequest) -> RawAgentResponse {
        let Some(provider) = &self.text else {
            debug!(shape = %request.shape(), "Text service not configured");
            return RawAgentResponse::failed(FailureReason::ServiceNotConfigured);
        };

        let started = Instant::now();
        let outcome = provider
            .complete(request.to_messages(), request.to_options())
            .await;
        let elapsed_ms = started.elapsed().as_millis();

        match outcome {
            Ok(completion) => {
                debug!(
                    shape = %request.shape(),
                    provider = provider.provider_name(),
                    model = %completion.model,
                    elapsed_ms,
                    output_tokens = ?completion.output_tokens,
                    "Agent call completed"
                );
                RawAgentResponse::text(completion.content)
            }
            Err(err) => {
                let reason = FailureReason::from_api_error(&err);
                warn!(
                    shape = %request.shape(),
                    provider = provider.provider_name(),
                    elapsed_ms,
                    reason = %reason,
                    "Agent call failed"
                );
                RawAgentResponse::failed(reason)
            }
        }
    }

    pub async fn generate_image(&self, request: &ImageRequest) -> RawAgentResponse {
        let Some(provider) = &self.image else {
            debug!("Image service not configured");
            return RawAgentResponse::failed(FailureReason::ServiceNotConfigured);
        };

        let started = Instant::now();
        match provider.generate(request).await {
            Ok(locations) => {
                debug!(
                    provider = provider.provider_name(),
                    count = locations.len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "Image call completed"
                );
                RawAgentResponse::images(locations)
            }
            Err(err) => {
                let reason = FailureReason::from_api_error(&err);
                warn!(provider = provider.provider_name(), reason = %reason, "Image call failed");
                RawAgentResponse::failed(reason)
            }
        }
    }

    /// Open one long-lived streaming connection for `request`.
    pub async fn open_stream(&self, request: &GenerationRequest) -> Result<ByteStream, FailureReason> {
        let Some(provider) = &self.text else {
            return Err(FailureReason::ServiceNotConfigured);
        };
        provider
            .stream(request.to_messages(), request.to_options())
            .await
            .map_err(|err| {
                let reason = FailureReason::from_api_error(&err);
                warn!(shape = %request.shape(), reason = %reason, "Stream could not be opened");
                reason
            })
    }
}
