//! CLI route: single route table and run context. Dispatches to pipeline flows and presentation.

use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{
    format_concepts_table, format_insights_table, format_json, format_opportunities_table,
    format_personas_table, format_project_table, format_validations_table,
};
use crate::coerce::{coerce_record, Coerce};
use crate::config::{ConfigLoader, PipelineConfig};
use crate::error::ApiError;
use crate::pipeline::Pipeline;
use crate::records::{Concept, Insight};
use crate::stream::{ObserverSignal, StreamEvent, StreamOutcome};
use crate::task::TaskOutcome;
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

/// Runtime context for CLI execution: loaded config and the pipeline built from it.
pub struct RunContext {
    pipeline: Pipeline,
    format: OutputFormat,
}

impl RunContext {
    /// Load config (explicit file, or the layered workspace sources) and build the pipeline.
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        format: OutputFormat,
    ) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Self::from_config(&config, format)
    }

    pub fn from_config(config: &PipelineConfig, format: OutputFormat) -> Result<Self, ApiError> {
        config.ensure_valid()?;
        let pipeline = Pipeline::from_config(config);
        info!(
            text_service = pipeline.client().has_text_service(),
            image_service = pipeline.client().has_image_service(),
            "Pipeline ready"
        );
        Ok(Self { pipeline, format })
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Run one command against `brief` and render its output.
    pub async fn execute(&self, command: &Commands, brief: &str) -> Result<String, ApiError> {
        let pipeline = &self.pipeline;
        let json = self.format == OutputFormat::Json;
        match command {
            Commands::Concepts => {
                let concepts = pipeline.generate_concepts(brief).await?;
                Ok(if json {
                    format_json(&concepts)
                } else {
                    format_concepts_table(pipeline, &concepts)
                })
            }
            Commands::Opportunities => {
                let insights = pipeline.generate_insights(brief).await?;
                let spaces = pipeline.generate_opportunity_spaces(&insights.value).await?;
                Ok(if json {
                    format_json(&json!({ "insights": insights, "opportunitySpaces": spaces }))
                } else {
                    format!(
                        "{}\n{}",
                        format_insights_table(&insights),
                        format_opportunities_table(pipeline, &spaces)
                    )
                })
            }
            Commands::Insights { stream: false } => {
                let insights = pipeline.generate_insights(brief).await?;
                Ok(self.render_insights(&insights))
            }
            Commands::Insights { stream: true } => {
                let insights = self.stream_insights(brief).await?;
                Ok(self.render_insights(&insights))
            }
            Commands::Personas { headshots } => {
                let mut personas = pipeline.generate_personas(brief).await?;
                if *headshots {
                    pipeline
                        .generate_persona_headshots(&mut personas.value)
                        .await?;
                }
                Ok(if json {
                    format_json(&personas)
                } else {
                    format_personas_table(&personas)
                })
            }
            Commands::Project => {
                let project = pipeline.generate_project_detail(brief).await?;
                Ok(if json {
                    format_json(&project)
                } else {
                    format_project_table(&project)
                })
            }
            Commands::Validate { markets } => {
                let concept = concept_from_brief(brief, pipeline)?;
                let validations = pipeline.validate_concept(&concept, markets).await?;
                Ok(if json {
                    format_json(&json!({ "concept": concept, "validations": validations }))
                } else {
                    format_validations_table(&validations)
                })
            }
        }
    }

    fn render_insights(&self, insights: &TaskOutcome<Vec<Insight>>) -> String {
        match self.format {
            OutputFormat::Json => format_json(insights),
            OutputFormat::Table => format_insights_table(insights),
        }
    }

    /// Echo chunks to stderr while the insights stream in.
    async fn stream_insights(&self, brief: &str) -> Result<TaskOutcome<Vec<Insight>>, ApiError> {
        let mut stderr = std::io::stderr();
        let mut observer = |event: StreamEvent<Vec<Insight>>| {
            let written = match event {
                StreamEvent::Stage(label) => writeln!(stderr, "[{}]", label),
                StreamEvent::Chunk { text, .. } => write!(stderr, "{}", text),
                StreamEvent::Final(_) => writeln!(stderr),
                StreamEvent::Failed(reason) => writeln!(stderr, "\nstream failed: {}", reason),
            };
            // A closed stderr means nobody is watching.
            match written {
                Ok(()) => ObserverSignal::Continue,
                Err(_) => ObserverSignal::Abandon,
            }
        };
        match self.pipeline.stream_insights(brief, &mut observer).await? {
            StreamOutcome::Done(outcome) | StreamOutcome::Failed(outcome) => Ok(outcome),
            StreamOutcome::Abandoned => {
                debug!("Insight stream abandoned; running the request without streaming");
                self.pipeline.generate_insights(brief).await
            }
        }
    }
}

/// A brief for `validate` is either a concept record (JSON) or free text describing one.
fn concept_from_brief(brief: &str, pipeline: &Pipeline) -> Result<Concept, ApiError> {
    let text = brief.trim();
    if text.is_empty() {
        return Err(ApiError::MissingInput("concept"));
    }
    let defaults = pipeline.defaults();
    if let Some(coerced) = coerce_record::<Concept>(text, defaults) {
        return Ok(coerced.value);
    }
    let mut concept = Concept::fallback(defaults);
    let title = text.lines().next().unwrap_or(text).trim();
    concept.title = title.to_string();
    concept.summary = title.to_string();
    concept.description = text.to_string();
    concept.keyword = defaults.keyword_for(None, title);
    Ok(concept)
}
