//! Response coercion: agent text to fixed-shape records.
//!
//! Coercion is pure and deterministic. Text goes through [`extract`] to get a JSON
//! value, then a record type's [`Coerce`] impl reads its fields through a
//! [`FieldReader`] that substitutes defaults, clamps numbers and enforces list arity.
//! A `None` result means the text was unparseable; callers fall back.

pub mod extract;
pub mod fields;
pub mod markets;

pub use fields::{FieldReader, ListArity};
pub use markets::{Alignment, CanonicalMarket, Market, MarketCatalog};

use crate::defaults::GenerationDefaults;
use serde_json::{Map, Value};

/// A record type that can be filled from a loose agent object.
pub trait Coerce: Sized {
    /// Keys an agent may wrap the record (or a list of records) under.
    const ENVELOPE_KEYS: &'static [&'static str];

    fn coerce_fields(fields: &mut FieldReader<'_>, defaults: &GenerationDefaults) -> Self;

    /// The documented fallback record.
    fn fallback(defaults: &GenerationDefaults) -> Self;
}

/// A coerced value plus the names of the fields that were defaulted.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced<T> {
    pub value: T,
    pub defaulted: Vec<&'static str>,
}

impl<T> Coerced<T> {
    pub fn is_partial(&self) -> bool {
        !self.defaulted.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Coerced<U> {
        Coerced {
            value: f(self.value),
            defaulted: self.defaulted,
        }
    }
}

/// The object holding one record: the value itself, the first object of an array,
/// or the contents of a single-key envelope.
pub fn record_object<'a>(value: &'a Value, envelope_keys: &[&str]) -> Option<&'a Map<String, Value>> {
    match value {
        Value::Object(map) => Some(unwrap_envelope(map, envelope_keys)),
        Value::Array(items) => items
            .iter()
            .find_map(Value::as_object)
            .map(|map| unwrap_envelope(map, envelope_keys)),
        _ => None,
    }
}

fn unwrap_envelope<'a>(map: &'a Map<String, Value>, envelope_keys: &[&str]) -> &'a Map<String, Value> {
    if map.len() == 1 {
        if let Some((key, Value::Object(inner))) = map.iter().next() {
            let named = envelope_keys.iter().any(|k| k.eq_ignore_ascii_case(key));
            // Any lone nested object is an envelope; records are never a single object field.
            if named || !inner.is_empty() {
                return inner;
            }
        }
    }
    map
}

pub fn coerce_value<T: Coerce>(value: &Value, defaults: &GenerationDefaults) -> Option<Coerced<T>> {
    let map = record_object(value, T::ENVELOPE_KEYS)?;
    Some(coerce_map(map, defaults))
}

fn coerce_map<T: Coerce>(map: &Map<String, Value>, defaults: &GenerationDefaults) -> Coerced<T> {
    let mut fields = FieldReader::for_map(map);
    let value = T::coerce_fields(&mut fields, defaults);
    Coerced {
        value,
        defaulted: fields.into_defaulted(),
    }
}

/// One record from agent text.
pub fn coerce_record<T: Coerce>(raw: &str, defaults: &GenerationDefaults) -> Option<Coerced<T>> {
    let value = extract::parse_candidate(raw)?;
    coerce_value(&value, defaults)
}

/// The array of records inside `value`: the value itself, an envelope key, or the
/// only array-valued field of a wrapper object. An object that reads as a `T` on its
/// own (any of its fields is one `T` understands) is a one-record list.
fn record_items<'a, T: Coerce>(
    value: &'a Value,
    defaults: &GenerationDefaults,
) -> Option<Vec<&'a Value>> {
    match value {
        Value::Array(items) => Some(items.iter().collect()),
        Value::Object(map) => {
            let reader = FieldReader::for_map(map);
            if let Some(Value::Array(items)) = reader.value_any(T::ENVELOPE_KEYS) {
                return Some(items.iter().collect());
            }
            if reads_as_record::<T>(map, defaults) {
                return Some(vec![value]);
            }
            let mut arrays = map.values().filter_map(Value::as_array);
            match (arrays.next(), arrays.next()) {
                (Some(items), None) if items.iter().any(Value::is_object) => {
                    Some(items.iter().collect())
                }
                _ => Some(vec![value]),
            }
        }
        _ => None,
    }
}

/// True when coercing `map` as a `T` reads at least one field instead of defaulting it.
fn reads_as_record<T: Coerce>(map: &Map<String, Value>, defaults: &GenerationDefaults) -> bool {
    let all_fields = coerce_map::<T>(&Map::new(), defaults).defaulted.len();
    coerce_map::<T>(map, defaults).defaulted.len() < all_fields
}

/// Between `arity.min` and `arity.max` records; missing ones are fallbacks.
pub fn coerce_record_list<T: Coerce>(
    value: &Value,
    arity: ListArity,
    defaults: &GenerationDefaults,
) -> Option<Coerced<Vec<T>>> {
    let items = record_items::<T>(value, defaults)?;
    let mut defaulted = Vec::new();
    let mut records: Vec<T> = items
        .into_iter()
        .filter_map(|item| record_object(item, T::ENVELOPE_KEYS))
        .take(arity.max)
        .map(|map| {
            let coerced = coerce_map::<T>(map, defaults);
            for field in coerced.defaulted {
                if !defaulted.contains(&field) {
                    defaulted.push(field);
                }
            }
            coerced.value
        })
        .collect();
    if records.len() < arity.min {
        defaulted.push("records");
        records.resize_with(arity.min, || T::fallback(defaults));
    }
    Some(Coerced {
        value: records,
        defaulted,
    })
}

pub fn coerce_records<T: Coerce>(
    raw: &str,
    arity: ListArity,
    defaults: &GenerationDefaults,
) -> Option<Coerced<Vec<T>>> {
    let value = extract::parse_candidate(raw)?;
    coerce_record_list(&value, arity, defaults)
}
