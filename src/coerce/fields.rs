//! Field-level coercion: typed reads with defaults, clamping and list arity.

use serde_json::{Map, Value};
use std::ops::RangeInclusive;

/// Allowed length of a list field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListArity {
    pub min: usize,
    pub max: usize,
}

impl ListArity {
    pub const fn exactly(n: usize) -> Self {
        Self { min: n, max: n }
    }

    pub const fn between(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, len: usize) -> bool {
        (self.min..=self.max).contains(&len)
    }
}

const GENERIC_PLACEHOLDER: &str = "To be defined";

/// Case- and separator-insensitive key form: `opportunityScore` == `opportunity_score`.
fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Reads fields out of one agent object, remembering which ones fell back to defaults.
pub struct FieldReader<'a> {
    map: Option<&'a Map<String, Value>>,
    defaulted: Vec<&'static str>,
}

impl<'a> FieldReader<'a> {
    /// Non-object values read as an empty object.
    pub fn new(value: &'a Value) -> Self {
        Self {
            map: value.as_object(),
            defaulted: Vec::new(),
        }
    }

    pub fn for_map(map: &'a Map<String, Value>) -> Self {
        Self {
            map: Some(map),
            defaulted: Vec::new(),
        }
    }

    pub fn value(&self, key: &str) -> Option<&'a Value> {
        let map = self.map?;
        if let Some(value) = map.get(key) {
            return Some(value);
        }
        let wanted = normalize_key(key);
        map.iter()
            .find(|(candidate, _)| normalize_key(candidate) == wanted)
            .map(|(_, value)| value)
    }

    /// First present value among `keys`, in order.
    pub fn value_any(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter().find_map(|key| self.value(key).filter(|v| !v.is_null()))
    }

    pub fn mark_defaulted(&mut self, key: &'static str) {
        if !self.defaulted.contains(&key) {
            self.defaulted.push(key);
        }
    }

    pub fn defaulted(&self) -> &[&'static str] {
        &self.defaulted
    }

    pub fn into_defaulted(self) -> Vec<&'static str> {
        self.defaulted
    }

    pub fn text(&mut self, key: &'static str, default: &str) -> String {
        self.text_any(&[key], default)
    }

    /// Required string read under any of several spellings; the first key names the field.
    pub fn text_any(&mut self, keys: &[&'static str], default: &str) -> String {
        match self.value_any(keys).and_then(scalar_text) {
            Some(text) => text,
            None => {
                self.mark_defaulted(keys[0]);
                default.trim().to_string()
            }
        }
    }

    /// Optional string; absence is not a defaulted field.
    pub fn optional_text(&self, key: &str) -> Option<String> {
        self.value(key).and_then(scalar_text)
    }

    /// Integer in `range`. Out-of-range values are clamped; unreadable ones take `default`.
    pub fn score(&mut self, key: &'static str, range: RangeInclusive<u32>, default: u32) -> u32 {
        self.score_any(&[key], range, default)
    }

    pub fn score_any(
        &mut self,
        keys: &[&'static str],
        range: RangeInclusive<u32>,
        default: u32,
    ) -> u32 {
        match self.value_any(keys).and_then(number_of) {
            Some(number) => clamp_number(number, &range),
            None => {
                self.mark_defaulted(keys[0]);
                default.clamp(*range.start(), *range.end())
            }
        }
    }

    /// Percentage in `0..=100`. Fractions in `(0, 1]` (`0.8`, `"0.8"`, `1.0`) read as shares.
    pub fn percent(&mut self, key: &'static str, default: u32) -> u32 {
        let range = 0..=100;
        let Some(value) = self.value(key).filter(|v| !v.is_null()) else {
            self.mark_defaulted(key);
            return default.min(100);
        };
        match number_of(value) {
            Some(number) if is_fraction(value, number) => clamp_number(number * 100.0, &range),
            Some(number) => clamp_number(number, &range),
            None => {
                self.mark_defaulted(key);
                default.min(100)
            }
        }
    }

    pub fn list(
        &mut self,
        key: &'static str,
        arity: ListArity,
        placeholders: &[String],
    ) -> Vec<String> {
        self.list_any(&[key], arity, placeholders)
    }

    /// List field: well-formed entries, truncated to `arity.max`, padded to `arity.min`.
    pub fn list_any(
        &mut self,
        keys: &[&'static str],
        arity: ListArity,
        placeholders: &[String],
    ) -> Vec<String> {
        let mut entries = self.value_any(keys).map(list_entries).unwrap_or_default();
        entries.truncate(arity.max);
        if entries.len() < arity.min {
            self.mark_defaulted(keys[0]);
            pad_with_placeholders(&mut entries, arity.min, placeholders);
        }
        entries
    }
}

/// Pad `entries` up to `min`, cycling through placeholders not already present.
pub fn pad_with_placeholders(entries: &mut Vec<String>, min: usize, placeholders: &[String]) {
    let usable: Vec<&String> = placeholders
        .iter()
        .filter(|p| !p.trim().is_empty())
        .collect();
    let mut cursor = 0usize;
    while entries.len() < min {
        let next = if usable.is_empty() {
            GENERIC_PLACEHOLDER.to_string()
        } else {
            // Prefer placeholders the list does not contain yet.
            let fresh = usable
                .iter()
                .cycle()
                .skip(cursor)
                .take(usable.len())
                .find(|p| !entries.iter().any(|e| e == p.as_str()));
            let chosen = fresh.unwrap_or(&usable[cursor % usable.len()]);
            chosen.trim().to_string()
        };
        cursor += 1;
        entries.push(next);
    }
}

/// Strings, numbers and booleans as trimmed text; anything else is not a scalar.
pub fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

const ENTRY_TEXT_KEYS: [&str; 5] = ["text", "title", "name", "description", "value"];

/// Entries of a list-ish value: arrays, or bullet/newline separated strings.
pub fn list_entries(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(map) => ENTRY_TEXT_KEYS
                    .iter()
                    .find_map(|key| map.get(*key).and_then(scalar_text)),
                other => scalar_text(other),
            })
            .collect(),
        Value::String(text) => split_text_list(text),
        Value::Number(_) | Value::Bool(_) => scalar_text(value).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn split_text_list(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let pieces: Vec<&str> = if lines.len() <= 1 && text.contains(';') {
        text.split(';').collect()
    } else {
        lines
    };
    pieces
        .into_iter()
        .map(strip_bullet)
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_bullet(line: &str) -> &str {
    let line = line.trim();
    let line = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("• "))
        .unwrap_or(line);
    // Numbered items: "1. text" / "2) text"
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(stripped) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return stripped.trim();
        }
    }
    line.trim()
}

/// Numbers, or strings that start with one: `"85"`, `"85%"`, `"85/100"`.
pub fn number_of(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            let end = s
                .char_indices()
                .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || (*i == 0 && *c == '-')))
                .map(|(i, _)| i)
                .unwrap_or(s.len());
            s[..end].parse::<f64>().ok()?
        }
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Written with a decimal point, not as a percentage, and within `(0, 1]`.
fn is_fraction(value: &Value, number: f64) -> bool {
    let decimal = match value {
        Value::Number(n) => n.is_f64(),
        Value::String(s) => s.contains('.') && !s.contains('%') && !s.contains('/'),
        _ => false,
    };
    decimal && number > 0.0 && number <= 1.0
}

fn clamp_number(number: f64, range: &RangeInclusive<u32>) -> u32 {
    let clamped = number
        .round()
        .clamp(f64::from(*range.start()), f64::from(*range.end()));
    clamped as u32
}
