use crate::coerce::{Coerce, FieldReader, ListArity};
use crate::defaults::GenerationDefaults;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const OPPORTUNITY_SCORE_RANGE: RangeInclusive<u32> = 0..=95;
pub const THEME_ARITY: ListArity = ListArity::exactly(3);
pub const TARGET_USER_ARITY: ListArity = ListArity::between(1, 3);

/// An opportunity space derived from selected insights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunitySpace {
    pub title: String,
    pub summary: String,
    pub description: String,
    pub themes: Vec<String>,
    pub target_users: Vec<String>,
    pub opportunity_score: u32,
    pub keyword: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Coerce for OpportunitySpace {
    const ENVELOPE_KEYS: &'static [&'static str] =
        &["opportunitySpace", "opportunity", "opportunities", "opportunitySpaces"];

    fn coerce_fields(fields: &mut FieldReader<'_>, defaults: &GenerationDefaults) -> Self {
        let table = &defaults.opportunity;
        let title = fields.text_any(&["title", "name"], &table.title);
        let summary = fields.text("summary", &table.summary);
        let description = fields.text("description", &table.description);
        let themes = fields.list("themes", THEME_ARITY, &table.themes);
        let target_users = fields.list_any(
            &["targetUsers", "users", "audience"],
            TARGET_USER_ARITY,
            &table.target_users,
        );
        let opportunity_score = fields.score_any(
            &["opportunityScore", "score"],
            OPPORTUNITY_SCORE_RANGE,
            table.opportunity_score,
        );
        let keyword = defaults.keyword_for(fields.optional_text("keyword").as_deref(), &title);
        let image_url = fields.optional_text("imageUrl");

        OpportunitySpace {
            title,
            summary,
            description,
            themes,
            target_users,
            opportunity_score,
            keyword,
            image_url,
        }
    }

    fn fallback(defaults: &GenerationDefaults) -> Self {
        let empty = serde_json::Value::Null;
        OpportunitySpace::coerce_fields(&mut FieldReader::new(&empty), defaults)
    }
}
