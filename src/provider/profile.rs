//! Provider profiles as they appear in configuration files.

use crate::error::ApiError;
use crate::provider::image::{ImageProviderClient, OpenAIImageClient};
use crate::provider::{ModelProvider, ModelProviderClient};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    Anthropic,
    Ollama,
    #[serde(rename = "local")]
    LocalCustom,
}

impl ProviderType {
    /// Environment variable consulted when the profile carries no key.
    pub fn api_key_env(self) -> Option<&'static str> {
        match self {
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderType::Ollama | ProviderType::LocalCustom => None,
        }
    }
}

/// A configured text or image provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub provider_name: Option<String>,
    pub provider_type: ProviderType,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model cannot be empty".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(format!("Invalid endpoint URL: {}", endpoint));
            }
        }
        if self.provider_type == ProviderType::LocalCustom && self.endpoint.is_none() {
            return Err("Local providers require an endpoint".to_string());
        }
        Ok(())
    }

    fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                self.provider_type
                    .api_key_env()
                    .and_then(|var| std::env::var(var).ok())
                    .filter(|key| !key.trim().is_empty())
            })
    }

    fn label(&self) -> String {
        self.provider_name
            .clone()
            .unwrap_or_else(|| format!("{:?}", self.provider_type).to_lowercase())
    }

    /// Resolve into a concrete provider. A hosted provider without a key is not configured.
    pub fn to_model_provider(&self) -> Result<ModelProvider, ApiError> {
        let model = self.model.clone();
        match self.provider_type {
            ProviderType::OpenAI => Ok(ModelProvider::OpenAI {
                model,
                api_key: self.require_key()?,
                base_url: self.endpoint.clone(),
            }),
            ProviderType::Anthropic => Ok(ModelProvider::Anthropic {
                model,
                api_key: self.require_key()?,
            }),
            ProviderType::Ollama => Ok(ModelProvider::Ollama {
                model,
                base_url: self.endpoint.clone(),
            }),
            ProviderType::LocalCustom => Ok(ModelProvider::LocalCustom {
                model,
                endpoint: self.endpoint.clone().ok_or_else(|| {
                    ApiError::ProviderNotConfigured(format!(
                        "{}: local provider has no endpoint",
                        self.label()
                    ))
                })?,
                api_key: self.resolved_api_key(),
            }),
        }
    }

    fn require_key(&self) -> Result<String, ApiError> {
        self.resolved_api_key().ok_or_else(|| {
            ApiError::ProviderNotConfigured(format!("{}: no API key available", self.label()))
        })
    }

    pub fn create_text_client(&self) -> Result<Box<dyn ModelProviderClient>, ApiError> {
        self.to_model_provider()?.connect()
    }

    /// Image generation is served over the OpenAI-compatible images endpoint.
    pub fn create_image_client(&self) -> Result<Box<dyn ImageProviderClient>, ApiError> {
        match self.provider_type {
            ProviderType::OpenAI => Ok(Box::new(OpenAIImageClient::new(
                self.model.clone(),
                Some(self.require_key()?),
                self.endpoint.clone(),
            )?)),
            ProviderType::LocalCustom => Ok(Box::new(OpenAIImageClient::new(
                self.model.clone(),
                self.resolved_api_key(),
                self.endpoint.clone(),
            )?)),
            other => Err(ApiError::ProviderNotConfigured(format!(
                "{}: {:?} does not serve image generation",
                self.label(),
                other
            ))),
        }
    }
}
