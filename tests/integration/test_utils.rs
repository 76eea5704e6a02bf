//! Shared test utilities for integration tests
//!
//! Scripted text and image services that answer by matching substrings of the
//! request, plus environment isolation for config tests.

use async_trait::async_trait;
use ideagen::provider::{
    ByteStream, ChatMessage, CompletionOptions, Completion, ImageProviderClient,
    ImageRequest, ModelProviderClient,
};
use ideagen::{AgentClient, ApiError, GenerationDefaults, Pipeline};
use ideagen::prompts::PromptSet;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// What the scripted service does for a matching request
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Delayed(u64, String),
    Status(u16),
    Timeout,
}

impl Reply {
    pub fn json(value: serde_json::Value) -> Self {
        Reply::Text(value.to_string())
    }
}

/// A text service answering the first rule whose needles all appear in the request.
/// Unmatched requests get a 500.
#[derive(Default)]
pub struct ScriptedText {
    rules: Vec<(Vec<String>, Reply)>,
    stream_chunks: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, needle: &str, reply: Reply) -> Self {
        self.on_all(&[needle], reply)
    }

    pub fn on_all(mut self, needles: &[&str], reply: Reply) -> Self {
        let needles = needles.iter().map(|n| n.to_string()).collect();
        self.rules.push((needles, reply));
        self
    }

    pub fn streaming(mut self, chunks: &[&str]) -> Self {
        self.stream_chunks = chunks.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Number of requests seen whose text contains `needle`.
    pub fn calls_containing(&self, needle: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.contains(needle)).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    fn reply_for(&self, request: &str) -> Reply {
        self.rules
            .iter()
            .find(|(needles, _)| needles.iter().all(|n| request.contains(n.as_str())))
            .map(|(_, reply)| reply.clone())
            .unwrap_or(Reply::Status(500))
    }
}

fn request_text(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n---\n")
}

#[async_trait]
impl ModelProviderClient for ScriptedText {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<Completion, ApiError> {
        let request = request_text(&messages);
        self.calls.lock().push(request.clone());
        let content = match self.reply_for(&request) {
            Reply::Text(text) => text,
            Reply::Delayed(ms, text) => {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                text
            }
            Reply::Status(status) => {
                return Err(ApiError::ProviderStatus {
                    status,
                    message: "scripted failure".to_string(),
                })
            }
            Reply::Timeout => {
                return Err(ApiError::ProviderRequestFailed(
                    "Request timeout: scripted".to_string(),
                ))
            }
        };
        Ok(Completion {
            content,
            model: "scripted".to_string(),
            output_tokens: None,
        })
    }

    async fn stream(
        &self,
        messages: Vec<ChatMessage>,
        _options: CompletionOptions,
    ) -> Result<ByteStream, ApiError> {
        self.calls.lock().push(request_text(&messages));
        let chunks: Vec<Result<Vec<u8>, ApiError>> = self
            .stream_chunks
            .iter()
            .map(|c| Ok(c.as_bytes().to_vec()))
            .collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

/// An image service that fails for prompts containing any of `fail_on`
#[derive(Default)]
pub struct ScriptedImages {
    fail_on: Vec<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedImages {
    pub fn failing_on(needles: &[&str]) -> Self {
        Self {
            fail_on: needles.iter().map(|n| n.to_string()).collect(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ImageProviderClient for ScriptedImages {
    async fn generate(&self, request: &ImageRequest) -> Result<Vec<String>, ApiError> {
        let n = {
            let mut prompts = self.prompts.lock();
            prompts.push(request.prompt.clone());
            prompts.len()
        };
        if self.fail_on.iter().any(|needle| request.prompt.contains(needle.as_str())) {
            return Err(ApiError::ProviderStatus {
                status: 400,
                message: "content policy".to_string(),
            });
        }
        Ok(vec![format!("https://img.test/{}.png", n)])
    }

    fn provider_name(&self) -> &str {
        "scripted-images"
    }
}

pub fn pipeline_with(text: Arc<ScriptedText>, images: Arc<ScriptedImages>) -> Pipeline {
    let client = AgentClient::unconfigured().with_text(text).with_image(images);
    Pipeline::new(client, GenerationDefaults::default(), PromptSet::default())
}

pub fn offline_pipeline() -> Pipeline {
    Pipeline::new(
        AgentClient::unconfigured(),
        GenerationDefaults::default(),
        PromptSet::default(),
    )
}

/// One OpenAI-style streamed delta frame.
pub fn sse_delta(text: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({"choices": [{"delta": {"content": text}}]})
    )
}

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = parking_lot::const_mutex(());

const ISOLATED_VARS: [&str; 4] = ["HOME", "XDG_CONFIG_HOME", "IDEAGEN_ENV", "IDEAGEN__LOGGING__LEVEL"];

/// Run `test` with HOME and XDG_CONFIG_HOME pointed into a fresh temp dir and the
/// ideagen environment overrides cleared. The original values are restored afterwards.
pub fn with_isolated_env<F, R>(test: F) -> R
where
    F: FnOnce(&TempDir) -> R,
{
    let _guard = ENV_MUTEX.lock();
    let saved: Vec<_> = ISOLATED_VARS
        .iter()
        .map(|key| (*key, std::env::var_os(key)))
        .collect();

    let temp = TempDir::new().unwrap();
    let config_home = temp.path().join(".config");
    std::fs::create_dir_all(&config_home).unwrap();
    std::env::set_var("HOME", temp.path());
    std::env::set_var("XDG_CONFIG_HOME", &config_home);
    std::env::remove_var("IDEAGEN_ENV");
    std::env::remove_var("IDEAGEN__LOGGING__LEVEL");

    let result = test(&temp);

    for (key, value) in saved {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
    result
}

/// Instruction markers of the default prompt set
pub const IDEATION: &str = "You generate product concepts";
pub const CONCEPT_DETAIL: &str = "You expand one concept seed";
pub const IMAGE_PROMPT: &str = "You write one prompt for an image generator";
pub const OPPORTUNITY_SPACE: &str = "You describe one opportunity space";
pub const INSIGHTS: &str = "You extract research insights";
pub const PERSONAS: &str = "You draft user personas";
pub const HEADSHOTS: &str = "You write photographic headshot prompts";
pub const VALIDATION: &str = "You assess a concept";

/// Ideation reply with the given seed titles
pub fn seeds_reply(titles: &[&str]) -> Reply {
    let seeds: Vec<_> = titles
        .iter()
        .map(|title| serde_json::json!({"title": title, "description": format!("{} pitch", title)}))
        .collect();
    Reply::json(serde_json::json!({ "seeds": seeds }))
}
