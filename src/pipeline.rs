//! Generation pipeline: single tasks, fan-outs and chained stages composed into flows.
//!
//! A [`Pipeline`] bundles the agent client with the immutable default tables and
//! prompts. It is cheap to clone and holds no mutable state; every flow method takes
//! `&self` and can run concurrently with others.

pub mod flows;
pub mod seed_detail;
pub mod visual;

pub use seed_detail::SEED_COUNT;
pub use visual::{Visual, VisualSubject};

use crate::agent::AgentClient;
use crate::config::PipelineConfig;
use crate::defaults::GenerationDefaults;
use crate::fanout::{FanOutExecutor, ProgressSink};
use crate::prompts::PromptSet;
use std::sync::Arc;

#[derive(Clone)]
pub struct Pipeline {
    client: AgentClient,
    defaults: Arc<GenerationDefaults>,
    prompts: Arc<PromptSet>,
    executor: FanOutExecutor,
}

impl Pipeline {
    pub fn new(client: AgentClient, defaults: GenerationDefaults, prompts: PromptSet) -> Self {
        Self {
            client,
            defaults: Arc::new(defaults),
            prompts: Arc::new(prompts),
            executor: FanOutExecutor::default(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.agent_client(),
            config.defaults.clone(),
            config.prompts.clone(),
        )
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.executor = self.executor.with_progress(progress);
        self
    }

    pub fn client(&self) -> &AgentClient {
        &self.client
    }

    pub fn defaults(&self) -> &GenerationDefaults {
        &self.defaults
    }

    pub fn prompts(&self) -> &PromptSet {
        &self.prompts
    }

    pub fn executor(&self) -> &FanOutExecutor {
        &self.executor
    }
}
