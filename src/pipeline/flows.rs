//! Product flows composed from single tasks, fan-outs and visual enrichment.
//!
//! Every flow returns a complete, fixed-length result. The only error a flow
//! surfaces is missing or invalid caller input, checked before any agent call.

use crate::agent::{GenerationRequest, TargetShape, Tuning};
use crate::coerce::extract::parse_candidate;
use crate::coerce::fields::list_entries;
use crate::coerce::{coerce_record, coerce_records, Coerce, Coerced, FieldReader, ListArity};
use crate::error::ApiError;
use crate::pipeline::{Pipeline, SEED_COUNT};
use crate::prompts::render;
use crate::provider::ImageSize;
use crate::records::{
    assign_validations, Concept, Insight, MarketValidation, OpportunitySpace, PersonaCard,
    ProjectDetail, ValidationDraft, INSIGHT_COUNT, PERSONA_COUNT,
};
use crate::stream::{StreamObserver, StreamOutcome, StreamingAggregator};
use crate::task::{SingleAgentTask, TaskOutcome};
use serde_json::Value;
use tracing::info;

/// Opportunity spaces per insight set
pub const OPPORTUNITY_SPACE_COUNT: usize = 4;

/// Leading opportunity spaces that get an image
pub const ENRICHED_SPACE_COUNT: usize = 2;

/// Upper bound on validation entries read from one response
const VALIDATION_DRAFT_LIMIT: usize = 32;

fn require(input: &str, name: &'static str) -> Result<(), ApiError> {
    if input.trim().is_empty() {
        return Err(ApiError::MissingInput(name));
    }
    Ok(())
}

fn fallback_count<T>(outcomes: &[TaskOutcome<T>]) -> usize {
    outcomes.iter().filter(|outcome| outcome.is_fallback()).count()
}

fn insights_context(insights: &[Insight]) -> String {
    insights
        .iter()
        .enumerate()
        .map(|(i, insight)| {
            format!(
                "{}. {}: {}\n   Evidence: {}",
                i + 1,
                insight.title,
                insight.statement,
                insight.evidence.join("; ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn concept_context(concept: &Concept) -> String {
    format!(
        "Title: {}\nSummary: {}\nDescription: {}\nBenefits: {}",
        concept.title,
        concept.summary,
        concept.description,
        concept.benefits.join("; ")
    )
}

/// Exactly `count` prompts, in persona order; missing entries are `None`.
fn coerce_headshot_prompts(raw: &str, count: usize) -> Option<Coerced<Vec<Option<String>>>> {
    let value = parse_candidate(raw)?;
    let entries = match &value {
        Value::Array(_) => list_entries(&value),
        Value::Object(_) => list_entries(
            FieldReader::new(&value).value_any(&["prompts", "headshots", "headshotPrompts"])?,
        ),
        _ => return None,
    };
    let mut prompts: Vec<Option<String>> = entries.into_iter().take(count).map(Some).collect();
    let defaulted = if prompts.len() < count {
        prompts.resize(count, None);
        vec!["prompts"]
    } else {
        Vec::new()
    };
    Some(Coerced {
        value: prompts,
        defaulted,
    })
}

impl Pipeline {
    /// Five concepts for one opportunity, each with an image attempt.
    pub async fn generate_concepts(
        &self,
        opportunity: &str,
    ) -> Result<Vec<TaskOutcome<Concept>>, ApiError> {
        require(opportunity, "opportunity")?;
        let mut concepts = self.seed_then_detail(opportunity, SEED_COUNT).await;
        self.enrich(&mut concepts, ImageSize::Square).await;
        info!(
            flow = "concepts",
            count = concepts.len(),
            fallbacks = fallback_count(&concepts),
            "Flow complete"
        );
        Ok(concepts)
    }

    /// One opportunity space from one angle over the insights.
    pub async fn generate_opportunity_space(
        &self,
        context: &str,
        index: usize,
        count: usize,
    ) -> TaskOutcome<OpportunitySpace> {
        let defaults = self.defaults();
        let instructions = render(
            &self.prompts().opportunity_space,
            &[("index", (index + 1).to_string()), ("count", count.to_string())],
        );
        let request = GenerationRequest::new(
            instructions,
            context,
            TargetShape::OpportunitySpace,
            Tuning::CREATIVE,
        );
        SingleAgentTask::new(self.client(), request)
            .run(
                |text| coerce_record::<OpportunitySpace>(text, defaults),
                || OpportunitySpace::fallback(defaults),
            )
            .await
    }

    /// Four opportunity spaces in parallel; the first two get images.
    pub async fn generate_opportunity_spaces(
        &self,
        insights: &[Insight],
    ) -> Result<Vec<TaskOutcome<OpportunitySpace>>, ApiError> {
        if insights.is_empty() {
            return Err(ApiError::MissingInput("insights"));
        }
        let context = insights_context(insights);
        let tasks = (0..OPPORTUNITY_SPACE_COUNT)
            .map(|index| self.generate_opportunity_space(&context, index, OPPORTUNITY_SPACE_COUNT))
            .collect();
        let mut spaces = self.executor().run("opportunity_space", tasks).await;
        self.enrich(&mut spaces[..ENRICHED_SPACE_COUNT], ImageSize::Landscape)
            .await;
        info!(
            flow = "opportunity_spaces",
            count = spaces.len(),
            fallbacks = fallback_count(&spaces),
            "Flow complete"
        );
        Ok(spaces)
    }

    fn insights_request(&self, scope: &str) -> GenerationRequest {
        GenerationRequest::new(
            render(&self.prompts().insights, &[("count", INSIGHT_COUNT.to_string())]),
            scope,
            TargetShape::Insights,
            Tuning::ANALYTIC,
        )
    }

    /// Four insights from one call.
    pub async fn generate_insights(&self, scope: &str) -> Result<TaskOutcome<Vec<Insight>>, ApiError> {
        require(scope, "scope")?;
        let defaults = self.defaults();
        let outcome = SingleAgentTask::new(self.client(), self.insights_request(scope))
            .run(
                |text| coerce_records::<Insight>(text, ListArity::exactly(INSIGHT_COUNT), defaults),
                || vec![Insight::fallback(defaults); INSIGHT_COUNT],
            )
            .await;
        info!(flow = "insights", fallback = outcome.is_fallback(), "Flow complete");
        Ok(outcome)
    }

    /// Four insights, streamed. The observer sees chunks as they arrive and the
    /// final coerced list; it may abandon the request at any notification.
    pub async fn stream_insights<O>(
        &self,
        scope: &str,
        observer: &mut O,
    ) -> Result<StreamOutcome<Vec<Insight>>, ApiError>
    where
        O: StreamObserver<Vec<Insight>> + ?Sized,
    {
        require(scope, "scope")?;
        let defaults = self.defaults();
        let outcome = StreamingAggregator::new(self.client(), self.insights_request(scope))
            .run(
                observer,
                |text| coerce_records::<Insight>(text, ListArity::exactly(INSIGHT_COUNT), defaults),
                || vec![Insight::fallback(defaults); INSIGHT_COUNT],
            )
            .await;
        info!(
            flow = "insights_stream",
            abandoned = matches!(outcome, StreamOutcome::Abandoned),
            "Flow complete"
        );
        Ok(outcome)
    }

    /// Five persona cards from one call.
    pub async fn generate_personas(
        &self,
        brief: &str,
    ) -> Result<TaskOutcome<Vec<PersonaCard>>, ApiError> {
        require(brief, "brief")?;
        let defaults = self.defaults();
        let request = GenerationRequest::new(
            render(&self.prompts().personas, &[("count", PERSONA_COUNT.to_string())]),
            brief,
            TargetShape::Personas,
            Tuning::CREATIVE,
        );
        let outcome = SingleAgentTask::new(self.client(), request)
            .run(
                |text| {
                    coerce_records::<PersonaCard>(text, ListArity::exactly(PERSONA_COUNT), defaults)
                },
                || vec![PersonaCard::fallback(defaults); PERSONA_COUNT],
            )
            .await;
        info!(flow = "personas", fallback = outcome.is_fallback(), "Flow complete");
        Ok(outcome)
    }

    /// One prompt-writing call for all personas, then one image per prompt.
    ///
    /// Sets `image_url` on each persona; a missing prompt or failed image leaves `None`.
    pub async fn generate_persona_headshots(
        &self,
        personas: &mut [PersonaCard],
    ) -> Result<(), ApiError> {
        if personas.is_empty() {
            return Err(ApiError::MissingInput("personas"));
        }
        let count = personas.len();
        let context = personas
            .iter()
            .enumerate()
            .map(|(i, persona)| format!("{}. {}", i + 1, persona.portrait_brief()))
            .collect::<Vec<_>>()
            .join("\n");
        let request = GenerationRequest::new(
            render(&self.prompts().headshot_prompts, &[("count", count.to_string())]),
            context,
            TargetShape::HeadshotPrompts,
            Tuning::BRIEF,
        );
        let prompts = SingleAgentTask::new(self.client(), request)
            .run(|text| coerce_headshot_prompts(text, count), || vec![None; count])
            .await
            .into_value();

        let tasks = prompts
            .into_iter()
            .map(|prompt| async move {
                match prompt {
                    Some(prompt) => self.render_image(&prompt, ImageSize::Portrait).await,
                    None => None,
                }
            })
            .collect();
        let images = self.executor().run("persona_headshots", tasks).await;
        for (persona, image) in personas.iter_mut().zip(images) {
            persona.image_url = image;
        }
        info!(
            flow = "persona_headshots",
            count,
            generated = personas.iter().filter(|p| p.image_url.is_some()).count(),
            "Flow complete"
        );
        Ok(())
    }

    /// Two opportunities with three or four concepts each, from one call.
    pub async fn generate_project_detail(
        &self,
        brief: &str,
    ) -> Result<TaskOutcome<ProjectDetail>, ApiError> {
        require(brief, "brief")?;
        let defaults = self.defaults();
        let request = GenerationRequest::new(
            self.prompts().project_detail.clone(),
            brief,
            TargetShape::ProjectDetail,
            Tuning::DETAIL,
        );
        let outcome = SingleAgentTask::new(self.client(), request)
            .run(
                |text| coerce_record::<ProjectDetail>(text, defaults),
                || ProjectDetail::fallback(defaults),
            )
            .await;
        info!(flow = "project_detail", fallback = outcome.is_fallback(), "Flow complete");
        Ok(outcome)
    }

    /// One validation per requested market, in the order requested.
    pub async fn validate_concept(
        &self,
        concept: &Concept,
        market_ids: &[String],
    ) -> Result<TaskOutcome<Vec<MarketValidation>>, ApiError> {
        if market_ids.is_empty() {
            return Err(ApiError::MissingInput("markets"));
        }
        let defaults = self.defaults();
        let markets = defaults
            .markets
            .select(market_ids)
            .map_err(|id| ApiError::InvalidInput(format!("Unknown market: {}", id)))?;
        let ids = markets
            .iter()
            .map(|market| market.id.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let request = GenerationRequest::new(
            render(&self.prompts().validation, &[("markets", ids)]),
            concept_context(concept),
            TargetShape::MarketValidation,
            Tuning::ANALYTIC,
        );
        let arity = ListArity::between(0, VALIDATION_DRAFT_LIMIT);
        let outcome = SingleAgentTask::new(self.client(), request)
            .run(
                |text| {
                    coerce_records::<ValidationDraft>(text, arity, defaults)
                        .map(|drafts| drafts.map(|d| assign_validations(d, &markets, defaults)))
                },
                || assign_validations(Vec::new(), &markets, defaults),
            )
            .await;
        info!(
            flow = "validation",
            markets = markets.len(),
            fallback = outcome.is_fallback(),
            "Flow complete"
        );
        Ok(outcome)
    }
}
