//! Canonical market set and matching of agent market entries against it.
//!
//! The catalog order is the output order. Agent entries only contribute
//! alignment and nuances; identity always comes from the catalog.

use crate::coerce::fields::{
    list_entries, pad_with_placeholders, scalar_text, FieldReader, ListArity,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

pub const NUANCE_ARITY: ListArity = ListArity::between(1, 2);

/// How well an idea fits a market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    High,
    Medium,
    Low,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::High => "high",
            Alignment::Medium => "medium",
            Alignment::Low => "low",
        }
    }

    /// Lenient parse: `"High"`, `"strong fit"`, `"moderate"`, `"weak"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        let word = lowered
            .split(|c: char| !c.is_ascii_alphabetic())
            .find(|w| !w.is_empty())?;
        match word {
            "high" | "strong" | "excellent" | "great" => Some(Alignment::High),
            "medium" | "moderate" | "mid" | "mixed" | "fair" => Some(Alignment::Medium),
            "low" | "weak" | "poor" | "limited" => Some(Alignment::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One market of the canonical set, with the copy used when the agent says nothing about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalMarket {
    pub id: String,
    pub name: String,
    pub default_alignment: Alignment,
    pub default_nuances: Vec<String>,
}

impl CanonicalMarket {
    pub fn new(id: &str, name: &str, alignment: Alignment, nuance: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            default_alignment: alignment,
            default_nuances: vec![nuance.to_string()],
        }
    }

    pub fn to_default_market(&self) -> Market {
        let mut nuances: Vec<String> = self
            .default_nuances
            .iter()
            .filter(|n| !n.trim().is_empty())
            .take(NUANCE_ARITY.max)
            .cloned()
            .collect();
        pad_with_placeholders(&mut nuances, NUANCE_ARITY.min, &[]);
        Market {
            id: self.id.clone(),
            name: self.name.clone(),
            alignment: self.default_alignment,
            nuances,
        }
    }
}

/// Market entry of a concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub name: String,
    pub alignment: Alignment,
    pub nuances: Vec<String>,
}

/// Canonical markets in output order, plus lowercase alias -> market id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketCatalog {
    pub markets: Vec<CanonicalMarket>,
    pub aliases: BTreeMap<String, String>,
}

impl Default for MarketCatalog {
    fn default() -> Self {
        let markets = vec![
            CanonicalMarket::new(
                "USA",
                "United States",
                Alignment::Medium,
                "Large addressable market with strong competition.",
            ),
            CanonicalMarket::new(
                "JPN",
                "Japan",
                Alignment::Medium,
                "Quality expectations and localisation needs are high.",
            ),
            CanonicalMarket::new(
                "DEU",
                "Germany",
                Alignment::Medium,
                "Privacy and regulatory requirements shape adoption.",
            ),
        ];
        let aliases = [
            ("us", "USA"),
            ("u.s.", "USA"),
            ("u.s.a.", "USA"),
            ("united states of america", "USA"),
            ("america", "USA"),
            ("jp", "JPN"),
            ("jpn", "JPN"),
            ("nippon", "JPN"),
            ("de", "DEU"),
            ("ger", "DEU"),
            ("deutschland", "DEU"),
        ]
        .into_iter()
        .map(|(alias, id)| (alias.to_string(), id.to_string()))
        .collect();
        Self { markets, aliases }
    }
}

impl MarketCatalog {
    pub fn get(&self, id: &str) -> Option<&CanonicalMarket> {
        self.markets.iter().find(|m| m.id.eq_ignore_ascii_case(id))
    }

    /// Index of the canonical market a free-form label refers to.
    pub fn resolve(&self, label: &str) -> Option<usize> {
        let label = strip_parenthetical(label).trim().to_ascii_lowercase();
        if label.is_empty() {
            return None;
        }
        let by_identity = |needle: &str| {
            self.markets.iter().position(|m| {
                m.id.eq_ignore_ascii_case(needle) || m.name.eq_ignore_ascii_case(needle)
            })
        };
        by_identity(&label).or_else(|| {
            self.aliases
                .iter()
                .find(|(alias, _)| alias.trim().eq_ignore_ascii_case(&label))
                .and_then(|(_, id)| by_identity(id))
        })
    }

    /// Canonical markets for a caller-provided id list, in the caller's order.
    pub fn select(&self, ids: &[String]) -> Result<Vec<&CanonicalMarket>, String> {
        ids.iter()
            .map(|id| {
                self.resolve(id)
                    .map(|index| &self.markets[index])
                    .ok_or_else(|| id.clone())
            })
            .collect()
    }

    pub fn default_markets(&self) -> Vec<Market> {
        self.markets
            .iter()
            .map(CanonicalMarket::to_default_market)
            .collect()
    }
}

fn strip_parenthetical(label: &str) -> &str {
    match label.find('(') {
        Some(open) if open > 0 => &label[..open],
        _ => label,
    }
}

const LABEL_KEYS: [&str; 6] = ["id", "code", "market", "country", "name", "region"];

/// Markets in canonical order. The flag is true when any market fell back to its defaults.
pub fn coerce_markets(value: Option<&Value>, catalog: &MarketCatalog) -> (Vec<Market>, bool) {
    let labelled: Vec<(String, &Map<String, Value>)> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|entry| {
                let fields = FieldReader::for_map(entry);
                LABEL_KEYS
                    .iter()
                    .find_map(|key| fields.value(key).and_then(scalar_text))
                    .map(|label| (label, entry))
            })
            .collect(),
        // Keyed by market: {"USA": {...}, "Japan": {...}}
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(label, entry)| entry.as_object().map(|entry| (label.clone(), entry)))
            .collect(),
        _ => Vec::new(),
    };

    let mut matched: Vec<Option<&Map<String, Value>>> = vec![None; catalog.markets.len()];
    for (label, entry) in labelled {
        if let Some(index) = catalog.resolve(&label) {
            // First mention wins.
            if matched[index].is_none() {
                matched[index] = Some(entry);
            }
        }
    }

    let mut any_defaulted = false;
    let markets = catalog
        .markets
        .iter()
        .zip(matched)
        .map(|(canonical, entry)| match entry {
            Some(entry) => {
                let (market, defaulted) = market_from_entry(canonical, entry);
                any_defaulted |= defaulted;
                market
            }
            None => {
                any_defaulted = true;
                canonical.to_default_market()
            }
        })
        .collect();
    (markets, any_defaulted)
}

fn market_from_entry(canonical: &CanonicalMarket, entry: &Map<String, Value>) -> (Market, bool) {
    let fields = FieldReader::for_map(entry);
    let mut market = canonical.to_default_market();
    let mut defaulted = false;

    let alignment = ["alignment", "fit", "level"]
        .iter()
        .find_map(|key| fields.value(key).and_then(Value::as_str))
        .and_then(Alignment::parse);
    match alignment {
        Some(alignment) => market.alignment = alignment,
        None => defaulted = true,
    }

    let mut nuances: Vec<String> = ["nuances", "notes", "nuance"]
        .iter()
        .find_map(|key| fields.value(key))
        .map(list_entries)
        .unwrap_or_default();
    nuances.truncate(NUANCE_ARITY.max);
    if nuances.len() < NUANCE_ARITY.min {
        defaulted = true;
        nuances = market.nuances;
    }
    market.nuances = nuances;
    (market, defaulted)
}
