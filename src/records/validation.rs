use crate::coerce::markets::{Alignment, CanonicalMarket, NUANCE_ARITY};
use crate::coerce::{Coerce, FieldReader};
use crate::defaults::GenerationDefaults;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::RangeInclusive;

pub const VALIDATION_SCORE_RANGE: RangeInclusive<u32> = 0..=100;

/// Assessment of one concept in one market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketValidation {
    pub market_id: String,
    pub market_name: String,
    pub alignment: Alignment,
    pub nuances: Vec<String>,
    pub score: u32,
    pub verdict: String,
}

/// Agent view of a validation row, before it is bound to a canonical market.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationDraft {
    /// Market label as the agent wrote it, if any
    pub label: Option<String>,
    pub alignment: Option<Alignment>,
    pub nuances: Vec<String>,
    pub score: u32,
    pub verdict: String,
}

impl ValidationDraft {
    /// Bind to `market`; missing alignment and nuances come from the market's defaults.
    pub fn bind(self, market: &CanonicalMarket) -> MarketValidation {
        let defaults = market.to_default_market();
        let nuances = if self.nuances.is_empty() {
            defaults.nuances
        } else {
            self.nuances
        };
        MarketValidation {
            market_id: market.id.clone(),
            market_name: market.name.clone(),
            alignment: self.alignment.unwrap_or(defaults.alignment),
            nuances,
            score: self.score,
            verdict: self.verdict,
        }
    }
}

impl Coerce for ValidationDraft {
    const ENVELOPE_KEYS: &'static [&'static str] = &["validations", "results", "markets"];

    fn coerce_fields(fields: &mut FieldReader<'_>, defaults: &GenerationDefaults) -> Self {
        let table = &defaults.validation;
        let label = ["marketId", "market", "id", "country", "marketName", "name"]
            .iter()
            .find_map(|key| fields.optional_text(key));
        let alignment = fields
            .value_any(&["alignment", "fit"])
            .and_then(Value::as_str)
            .and_then(Alignment::parse);
        if alignment.is_none() {
            fields.mark_defaulted("alignment");
        }
        let mut nuances = fields
            .value_any(&["nuances", "notes"])
            .map(crate::coerce::fields::list_entries)
            .unwrap_or_default();
        nuances.truncate(NUANCE_ARITY.max);
        if nuances.is_empty() {
            fields.mark_defaulted("nuances");
        }
        let score = fields.score("score", VALIDATION_SCORE_RANGE, table.score);
        let verdict = fields.text_any(&["verdict", "summary", "recommendation"], &table.verdict);
        ValidationDraft {
            label,
            alignment,
            nuances,
            score,
            verdict,
        }
    }

    fn fallback(defaults: &GenerationDefaults) -> Self {
        ValidationDraft {
            label: None,
            alignment: None,
            nuances: Vec::new(),
            score: defaults.validation.score,
            verdict: defaults.validation.verdict.clone(),
        }
    }
}

/// One validation per requested market, in request order.
///
/// Drafts are matched to markets by label; unlabelled drafts fill the remaining
/// markets in order. Markets left over get fallback validations.
pub fn assign_validations(
    drafts: Vec<ValidationDraft>,
    markets: &[&CanonicalMarket],
    defaults: &GenerationDefaults,
) -> Vec<MarketValidation> {
    let mut slots: Vec<Option<ValidationDraft>> = vec![None; markets.len()];
    let mut unlabelled = Vec::new();

    for draft in drafts {
        let index = draft
            .label
            .as_deref()
            .and_then(|label| defaults.markets.resolve(label))
            .and_then(|catalog_index| {
                let id = &defaults.markets.markets[catalog_index].id;
                markets.iter().position(|m| &m.id == id)
            });
        match index {
            Some(index) if slots[index].is_none() => slots[index] = Some(draft),
            Some(_) => {}
            None if draft.label.is_none() => unlabelled.push(draft),
            None => {}
        }
    }

    let mut unlabelled = unlabelled.into_iter();
    slots
        .into_iter()
        .zip(markets)
        .map(|(slot, market)| {
            slot.or_else(|| unlabelled.next())
                .unwrap_or_else(|| ValidationDraft::fallback(defaults))
                .bind(market)
        })
        .collect()
}
