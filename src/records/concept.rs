//! Seeds and the concepts detailed from them.

use crate::coerce::markets::{coerce_markets, Market};
use crate::coerce::{Coerce, FieldReader, ListArity};
use crate::defaults::GenerationDefaults;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const OPPORTUNITY_SCORE_RANGE: RangeInclusive<u32> = 0..=95;
pub const BENEFIT_ARITY: ListArity = ListArity::exactly(3);
pub const VARIATION_ARITY: ListArity = ListArity::between(2, 3);

/// Minimal identity produced by ideation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed {
    pub title: String,
    pub description: String,
}

impl Seed {
    pub fn placeholder(defaults: &GenerationDefaults) -> Self {
        Seed {
            title: defaults.seed.title.clone(),
            description: defaults.seed.description.clone(),
        }
    }

    pub fn is_placeholder(&self, defaults: &GenerationDefaults) -> bool {
        self.title == defaults.seed.title
    }
}

impl Coerce for Seed {
    const ENVELOPE_KEYS: &'static [&'static str] = &["seeds", "concepts", "ideas", "seed"];

    fn coerce_fields(fields: &mut FieldReader<'_>, defaults: &GenerationDefaults) -> Self {
        let title = fields.text_any(&["title", "name"], &defaults.seed.title);
        let description = fields.text_any(
            &["description", "summary", "pitch"],
            &defaults.seed.description,
        );
        Seed { title, description }
    }

    fn fallback(defaults: &GenerationDefaults) -> Self {
        Seed::placeholder(defaults)
    }
}

/// A fully detailed concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    pub title: String,
    pub summary: String,
    pub description: String,
    pub benefits: Vec<String>,
    pub variations: Vec<String>,
    pub opportunity_score: u32,
    pub markets: Vec<Market>,
    pub keyword: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Concept {
    /// Identity fields always come from the seed, whatever the agent wrote.
    pub fn with_seed_identity(mut self, seed: &Seed, defaults: &GenerationDefaults) -> Self {
        // A keyword derived from the replaced title follows the new title.
        if self.keyword == defaults.keyword_for(None, &self.title) {
            self.keyword = defaults.keyword_for(None, &seed.title);
        }
        self.title = seed.title.clone();
        self.summary = seed.description.clone();
        if seed.is_placeholder(defaults) {
            self.opportunity_score = self
                .opportunity_score
                .min(defaults.seed.placeholder_score_cap);
        }
        self
    }
}

impl Coerce for Concept {
    const ENVELOPE_KEYS: &'static [&'static str] = &["concept", "concepts"];

    fn coerce_fields(fields: &mut FieldReader<'_>, defaults: &GenerationDefaults) -> Self {
        let table = &defaults.concept;
        let title = fields.text_any(&["title", "name"], &defaults.seed.title);
        let summary = fields.text_any(&["summary", "tagline"], &defaults.seed.description);
        let description = fields.text("description", &table.description);
        let benefits = fields.list("benefits", BENEFIT_ARITY, &table.benefits);
        let variations = fields.list("variations", VARIATION_ARITY, &table.variations);
        let opportunity_score = fields.score_any(
            &["opportunityScore", "score"],
            OPPORTUNITY_SCORE_RANGE,
            table.opportunity_score,
        );
        let (markets, markets_defaulted) = coerce_markets(fields.value("markets"), &defaults.markets);
        if markets_defaulted {
            fields.mark_defaulted("markets");
        }
        let keyword = defaults.keyword_for(fields.optional_text("keyword").as_deref(), &title);
        let image_url = fields.optional_text("imageUrl");

        Concept {
            title,
            summary,
            description,
            benefits,
            variations,
            opportunity_score,
            markets,
            keyword,
            image_url,
        }
    }

    fn fallback(defaults: &GenerationDefaults) -> Self {
        let empty = serde_json::Value::Null;
        let mut fields = FieldReader::new(&empty);
        Concept::coerce_fields(&mut fields, defaults)
            .with_seed_identity(&Seed::placeholder(defaults), defaults)
    }
}
