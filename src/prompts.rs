//! Instruction text per agent. Every entry can be replaced from the `[prompts]` config section.

use serde::{Deserialize, Serialize};

/// Instructions for each agent, including the JSON shape it must return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSet {
    pub ideation: String,
    pub concept_detail: String,
    pub opportunity_space: String,
    pub insights: String,
    pub personas: String,
    pub headshot_prompts: String,
    pub image_prompt: String,
    pub project_detail: String,
    pub validation: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            ideation: "You generate product concepts for an opportunity. Return JSON only: \
                {\"seeds\": [{\"title\": string, \"description\": string}]} with exactly {count} \
                seeds. Order them from the most conservative (first) to the most divergent (last)."
                .to_string(),
            concept_detail: "You expand one concept seed into a full concept. Return JSON only: \
                {\"title\": string, \"summary\": string, \"description\": string, \
                \"benefits\": [3 strings], \"variations\": [2-3 strings], \
                \"opportunityScore\": integer 0-95, \"keyword\": one word for an image search, \
                \"markets\": [{\"market\": \"USA\"|\"JPN\"|\"DEU\", \
                \"alignment\": \"high\"|\"medium\"|\"low\", \"nuances\": [1-2 strings]}]}."
                .to_string(),
            opportunity_space: "You describe one opportunity space grounded in the given insights. \
                Angle {index} of {count}: make it distinct from the other angles. Return JSON only: \
                {\"title\": string, \"summary\": string, \"description\": string, \
                \"themes\": [3 strings], \"targetUsers\": [1-3 strings], \
                \"opportunityScore\": integer 0-95, \"keyword\": one word}."
                .to_string(),
            insights: "You extract research insights from a project scope. Return JSON only: \
                {\"insights\": [{\"title\": string, \"statement\": string, \
                \"evidence\": [2-3 strings], \"confidence\": integer 0-100}]} with exactly {count} \
                insights."
                .to_string(),
            personas: "You draft user personas from a brief. Return JSON only: \
                {\"personas\": [{\"name\": string, \"role\": string, \"quote\": string, \
                \"goals\": [3 strings], \"frustrations\": [3 strings], \"age\": integer}]} with \
                exactly {count} personas."
                .to_string(),
            headshot_prompts: "You write photographic headshot prompts, one per persona, in the \
                order given. Return JSON only: {\"prompts\": [string]} with exactly {count} prompts. \
                Neutral background, natural light, no text."
                .to_string(),
            image_prompt: "You write one prompt for an image generator that illustrates the idea \
                below. Photorealistic, no text or logos. Return only the prompt text."
                .to_string(),
            project_detail: "You break a project into opportunities and concepts. Return JSON only: \
                {\"opportunities\": [{\"title\": string, \"description\": string, \
                \"concepts\": [{\"title\": string, \"description\": string}]}]} with exactly 2 \
                opportunities of 3-4 concepts each."
                .to_string(),
            validation: "You assess a concept in each listed market. Return JSON only: \
                {\"validations\": [{\"market\": market id, \"alignment\": \"high\"|\"medium\"|\"low\", \
                \"nuances\": [1-2 strings], \"score\": integer 0-100, \"verdict\": short string}]} \
                with one entry per market: {markets}."
                .to_string(),
        }
    }
}

/// Substitute `{name}` placeholders. Unknown placeholders are left as written.
pub fn render(template: &str, vars: &[(&str, String)]) -> String {
    vars.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{}}}", name), value)
    })
}

impl PromptSet {
    pub fn validate(&self) -> Vec<String> {
        [
            ("ideation", &self.ideation),
            ("concept_detail", &self.concept_detail),
            ("opportunity_space", &self.opportunity_space),
            ("insights", &self.insights),
            ("personas", &self.personas),
            ("headshot_prompts", &self.headshot_prompts),
            ("image_prompt", &self.image_prompt),
            ("project_detail", &self.project_detail),
            ("validation", &self.validation),
        ]
        .iter()
        .filter(|(_, text)| text.trim().is_empty())
        .map(|(name, _)| format!("prompts.{} must not be empty", name))
        .collect()
    }
}
