//! Seed-then-detail: one ideation call yields N seeds, then N detail calls run in
//! parallel, each bound to one seed.
//!
//! Stage 2 always runs N times. Failed or short ideation is padded with placeholder
//! seeds, and every detail record takes its identity from its seed.

use crate::agent::{GenerationRequest, TargetShape, Tuning};
use crate::coerce::{coerce_record, coerce_records, Coerce, ListArity};
use crate::pipeline::Pipeline;
use crate::prompts::render;
use crate::records::{Concept, Seed};
use crate::task::{SingleAgentTask, TaskOutcome};
use tracing::info;

/// Seeds per ideation call
pub const SEED_COUNT: usize = 5;

impl Pipeline {
    /// Stage 1: exactly `count` seeds, ramped from conservative to divergent.
    pub async fn generate_seeds(&self, opportunity: &str, count: usize) -> TaskOutcome<Vec<Seed>> {
        let defaults = self.defaults();
        let request = GenerationRequest::new(
            render(&self.prompts().ideation, &[("count", count.to_string())]),
            opportunity,
            TargetShape::ConceptSeeds,
            Tuning::CREATIVE,
        );
        SingleAgentTask::new(self.client(), request)
            .run(
                |text| coerce_records::<Seed>(text, ListArity::exactly(count), defaults),
                || vec![Seed::placeholder(defaults); count],
            )
            .await
    }

    /// Stage 2 for one seed. The seed's title and description survive verbatim.
    pub async fn detail_concept(&self, opportunity: &str, seed: Seed) -> TaskOutcome<Concept> {
        let defaults = self.defaults();
        let context = format!(
            "Opportunity:\n{}\n\nSeed concept:\nTitle: {}\nDescription: {}",
            opportunity.trim(),
            seed.title,
            seed.description
        );
        let request = GenerationRequest::new(
            self.prompts().concept_detail.clone(),
            context,
            TargetShape::ConceptDetail,
            Tuning::DETAIL,
        );
        SingleAgentTask::new(self.client(), request)
            .run(
                |text| coerce_record::<Concept>(text, defaults),
                || Concept::fallback(defaults),
            )
            .await
            .map(|concept| concept.with_seed_identity(&seed, defaults))
    }

    /// Both stages: exactly `count` concepts, `concepts[i]` detailed from seed `i`.
    pub async fn seed_then_detail(
        &self,
        opportunity: &str,
        count: usize,
    ) -> Vec<TaskOutcome<Concept>> {
        let seeds = self.generate_seeds(opportunity, count).await;
        if seeds.is_fallback() {
            info!(count, "Ideation unavailable; detailing placeholder seeds");
        }
        let tasks = seeds
            .into_value()
            .into_iter()
            .map(|seed| self.detail_concept(opportunity, seed))
            .collect();
        self.executor().run("concept_detail", tasks).await
    }
}
