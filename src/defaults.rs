//! Default copy substituted whenever an agent fails or omits a field.
//!
//! One immutable [`GenerationDefaults`] is built at startup (built-ins overlaid with the
//! `[defaults]` config section) and shared by reference through the pipeline.

use crate::coerce::markets::MarketCatalog;
use serde::{Deserialize, Serialize};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Placeholder seed used when ideation fails or returns too few seeds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedDefaults {
    pub title: String,
    pub description: String,
    /// Upper bound on the opportunity score of records built from a placeholder seed.
    pub placeholder_score_cap: u32,
}

impl Default for SeedDefaults {
    fn default() -> Self {
        Self {
            title: "Concept (generation pending)".to_string(),
            description: "This concept could not be generated yet. Try regenerating it."
                .to_string(),
            placeholder_score_cap: 65,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConceptDefaults {
    pub description: String,
    pub benefits: Vec<String>,
    pub variations: Vec<String>,
    pub opportunity_score: u32,
}

impl Default for ConceptDefaults {
    fn default() -> Self {
        Self {
            description: "Details for this concept are not available yet.".to_string(),
            benefits: strings(&[
                "Addresses a clear customer need",
                "Builds on existing capabilities",
                "Can be tested with a small pilot",
            ]),
            variations: strings(&[
                "A lighter entry-level version",
                "A premium version with added services",
                "A partnership-led version",
            ]),
            opportunity_score: 65,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpportunityDefaults {
    pub title: String,
    pub summary: String,
    pub description: String,
    pub themes: Vec<String>,
    pub target_users: Vec<String>,
    pub opportunity_score: u32,
}

impl Default for OpportunityDefaults {
    fn default() -> Self {
        Self {
            title: "Opportunity space (generation pending)".to_string(),
            summary: "An opportunity space derived from the selected insights.".to_string(),
            description: "Details for this opportunity space are not available yet."
                .to_string(),
            themes: strings(&["Unmet needs", "Emerging behaviours", "Market gaps"]),
            target_users: strings(&["Primary users", "Secondary users", "Decision makers"]),
            opportunity_score: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightDefaults {
    pub title: String,
    pub statement: String,
    pub evidence: Vec<String>,
    pub confidence: u32,
}

impl Default for InsightDefaults {
    fn default() -> Self {
        Self {
            title: "Insight (generation pending)".to_string(),
            statement: "This insight could not be generated yet.".to_string(),
            evidence: strings(&[
                "Evidence to be gathered from research",
                "Evidence to be validated with users",
                "Evidence to be confirmed with data",
            ]),
            confidence: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaDefaults {
    pub name: String,
    pub role: String,
    pub quote: String,
    pub goals: Vec<String>,
    pub frustrations: Vec<String>,
    pub age: u32,
}

impl Default for PersonaDefaults {
    fn default() -> Self {
        Self {
            name: "Persona (generation pending)".to_string(),
            role: "Target user".to_string(),
            quote: "I need something that just works.".to_string(),
            goals: strings(&[
                "Save time on routine tasks",
                "Make confident decisions",
                "Stay within budget",
            ]),
            frustrations: strings(&[
                "Too many disconnected tools",
                "Unclear pricing",
                "Slow support",
            ]),
            age: 35,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectDefaults {
    pub opportunity_title: String,
    pub opportunity_description: String,
    pub concept_title: String,
    pub concept_description: String,
}

impl Default for ProjectDefaults {
    fn default() -> Self {
        Self {
            opportunity_title: "Opportunity (generation pending)".to_string(),
            opportunity_description: "Details for this opportunity are not available yet."
                .to_string(),
            concept_title: "Concept (generation pending)".to_string(),
            concept_description: "Details for this concept are not available yet.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationDefaults {
    pub score: u32,
    pub verdict: String,
}

impl Default for ValidationDefaults {
    fn default() -> Self {
        Self {
            score: 50,
            verdict: "Validation pending".to_string(),
        }
    }
}

/// Deterministic, non-AI image used when a record has no generated image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackImage {
    /// URL with a `{keyword}` placeholder
    pub url_template: String,
    pub default_keyword: String,
}

impl Default for FallbackImage {
    fn default() -> Self {
        Self {
            url_template: "https://source.unsplash.com/featured/1024x1024/?{keyword}".to_string(),
            default_keyword: "innovation".to_string(),
        }
    }
}

impl FallbackImage {
    pub fn url_for(&self, keyword: &str) -> String {
        let keyword = keyword.trim();
        let keyword = if keyword.is_empty() {
            self.default_keyword.as_str()
        } else {
            keyword
        };
        self.url_template
            .replace("{keyword}", &encode_component(&keyword.to_ascii_lowercase()))
    }
}

fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push_str("%20"),
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

const STOPWORDS: [&str; 20] = [
    "the", "and", "for", "with", "from", "into", "your", "our", "that", "this", "a", "an", "of",
    "to", "in", "on", "by", "at", "smart", "new",
];

/// Short image keyword: first significant word of `title`, lowercased.
pub fn derive_keyword(title: &str) -> Option<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= 3)
        .map(str::to_lowercase)
        .find(|word| !STOPWORDS.contains(&word.as_str()) && !word.chars().all(|c| c.is_numeric()))
}

/// All default tables
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationDefaults {
    pub seed: SeedDefaults,
    pub concept: ConceptDefaults,
    pub opportunity: OpportunityDefaults,
    pub insight: InsightDefaults,
    pub persona: PersonaDefaults,
    pub project: ProjectDefaults,
    pub validation: ValidationDefaults,
    pub markets: MarketCatalog,
    pub fallback_image: FallbackImage,
}

impl GenerationDefaults {
    /// Keyword for a record: its own keyword if present, else derived from the title.
    pub fn keyword_for(&self, keyword: Option<&str>, title: &str) -> String {
        keyword
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase)
            .or_else(|| derive_keyword(title))
            .unwrap_or_else(|| self.fallback_image.default_keyword.clone())
    }

    pub fn fallback_image_url(&self, keyword: &str) -> String {
        self.fallback_image.url_for(keyword)
    }

    /// Problems that would make the tables unusable; empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.seed.title.trim().is_empty() {
            errors.push("defaults.seed.title must not be empty".to_string());
        }
        if self.markets.markets.is_empty() {
            errors.push("defaults.markets.markets must list at least one market".to_string());
        }
        for market in &self.markets.markets {
            if market.id.trim().is_empty() {
                errors.push("defaults.markets: market id must not be empty".to_string());
            }
        }
        for (alias, id) in &self.markets.aliases {
            if self.markets.get(id).is_none() {
                errors.push(format!(
                    "defaults.markets.aliases: alias '{}' points to unknown market '{}'",
                    alias, id
                ));
            }
        }
        if !self.fallback_image.url_template.contains("{keyword}") {
            errors.push("defaults.fallback_image.url_template must contain {keyword}".to_string());
        }
        errors
    }
}
