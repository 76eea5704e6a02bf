//! Generation requests: what one agent call is asked to do.

use crate::provider::{ChatMessage, CompletionOptions};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the output shape an agent is asked to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetShape {
    ConceptSeeds,
    ConceptDetail,
    OpportunitySpace,
    Insights,
    Personas,
    HeadshotPrompts,
    ImagePrompt,
    ProjectDetail,
    MarketValidation,
}

impl TargetShape {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetShape::ConceptSeeds => "concept_seeds",
            TargetShape::ConceptDetail => "concept_detail",
            TargetShape::OpportunitySpace => "opportunity_space",
            TargetShape::Insights => "insights",
            TargetShape::Personas => "personas",
            TargetShape::HeadshotPrompts => "headshot_prompts",
            TargetShape::ImagePrompt => "image_prompt",
            TargetShape::ProjectDetail => "project_detail",
            TargetShape::MarketValidation => "market_validation",
        }
    }

    /// Free-text shapes are not run through structured coercion.
    pub fn is_structured(self) -> bool {
        !matches!(self, TargetShape::ImagePrompt)
    }
}

impl fmt::Display for TargetShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sampling parameters for one call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Tuning {
    pub const fn new(temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            temperature,
            max_output_tokens,
        }
    }

    /// Divergent ideation
    pub const CREATIVE: Tuning = Tuning::new(0.9, 2048);
    /// Structured elaboration of a fixed idea
    pub const DETAIL: Tuning = Tuning::new(0.7, 2048);
    /// Short single-string outputs such as image prompts
    pub const BRIEF: Tuning = Tuning::new(0.7, 300);
    /// Assessments that should stay close to the evidence
    pub const ANALYTIC: Tuning = Tuning::new(0.4, 2048);
}

/// One immutable agent call. Built fresh per call and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    instructions: String,
    context: String,
    shape: TargetShape,
    tuning: Tuning,
}

impl GenerationRequest {
    pub fn new(
        instructions: impl Into<String>,
        context: impl Into<String>,
        shape: TargetShape,
        tuning: Tuning,
    ) -> Self {
        Self {
            instructions: instructions.into(),
            context: context.into(),
            shape,
            tuning,
        }
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn shape(&self) -> TargetShape {
        self.shape
    }

    pub fn tuning(&self) -> Tuning {
        self.tuning
    }

    pub fn to_messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.instructions.clone()),
            ChatMessage::user(self.context.clone()),
        ]
    }

    pub fn to_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.tuning.temperature),
            max_tokens: Some(self.tuning.max_output_tokens),
            json_output: self.shape.is_structured(),
        }
    }
}
