//! Configuration System
//!
//! Layered configuration for the generation pipeline: providers, default copy,
//! prompts and logging. Precedence, lowest first: built-in defaults, global file,
//! workspace `config/config.toml`, `config/{IDEAGEN_ENV}.toml`, `IDEAGEN__*` env vars.

use crate::agent::AgentClient;
use crate::defaults::GenerationDefaults;
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::prompts::PromptSet;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

pub use crate::provider::{ProviderConfig, ProviderType};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Text-generation service; absent means every text agent falls back
    pub text_provider: Option<ProviderConfig>,

    /// Image-generation service; absent means no generated images
    pub image_provider: Option<ProviderConfig>,

    /// Default copy, canonical markets and fallback images
    pub defaults: GenerationDefaults,

    /// Agent instructions
    pub prompts: PromptSet,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Provider(String, String),
    Defaults(String),
    Prompts(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(name, msg) => write!(f, "Provider '{}': {}", name, msg),
            ValidationError::Defaults(msg) => write!(f, "Defaults: {}", msg),
            ValidationError::Prompts(msg) => write!(f, "Prompts: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl PipelineConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (section, provider) in [
            ("text_provider", &self.text_provider),
            ("image_provider", &self.image_provider),
        ] {
            if let Some(provider) = provider {
                if let Err(e) = provider.validate() {
                    errors.push(ValidationError::Provider(section.to_string(), e));
                }
            }
        }
        if let Some(image) = &self.image_provider {
            if !matches!(
                image.provider_type,
                ProviderType::OpenAI | ProviderType::LocalCustom
            ) {
                errors.push(ValidationError::Provider(
                    "image_provider".to_string(),
                    format!("{:?} does not serve image generation", image.provider_type),
                ));
            }
        }

        errors.extend(
            self.defaults
                .validate()
                .into_iter()
                .map(ValidationError::Defaults),
        );
        errors.extend(self.prompts.validate().into_iter().map(ValidationError::Prompts));
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validation as a single crate error.
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }

    /// Build the agent client. A provider that cannot be set up (no API key, bad
    /// endpoint) is left out, so its agents report "service not configured".
    pub fn agent_client(&self) -> AgentClient {
        let text = self.text_provider.as_ref().and_then(|provider| {
            provider
                .create_text_client()
                .map_err(|e| warn!(error = %e, "Text service unavailable"))
                .ok()
        });
        let image = self.image_provider.as_ref().and_then(|provider| {
            provider
                .create_image_client()
                .map_err(|e| warn!(error = %e, "Image service unavailable"))
                .ok()
        });
        AgentClient::new(text.map(Arc::from), image.map(Arc::from))
    }
}
