//! ideagen: structured ideation pipelines over generative agents.
//!
//! Every flow returns a complete, schema-valid result set. Agent failures are
//! absorbed at the task boundary and replaced by documented placeholder records;
//! only missing caller input surfaces as an error.

pub mod agent;
pub mod cli;
pub mod coerce;
pub mod config;
pub mod defaults;
pub mod error;
pub mod fanout;
pub mod logging;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod records;
pub mod stream;
pub mod task;

pub use agent::{AgentClient, GenerationRequest, RawAgentResponse, TargetShape, Tuning};
pub use config::{ConfigLoader, PipelineConfig};
pub use defaults::GenerationDefaults;
pub use error::{ApiError, FailureReason, GenerationFault};
pub use pipeline::Pipeline;
pub use task::{Provenance, TaskOutcome};
