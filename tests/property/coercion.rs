//! Coercion invariants over arbitrary agent output

use ideagen::coerce::{coerce_record, coerce_records, ListArity};
use ideagen::records::concept::{BENEFIT_ARITY, OPPORTUNITY_SCORE_RANGE, VARIATION_ARITY};
use ideagen::records::{Concept, Insight, PersonaCard};
use ideagen::GenerationDefaults;
use proptest::prelude::*;
use serde_json::{json, Value};

/// Loose JSON values of the kinds agents produce
fn loose_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        (-1.0e6f64..1.0e6).prop_map(|n| json!(n)),
        "[a-zA-Z0-9 %/.,-]{0,24}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::hash_map("[a-zA-Z_]{1,16}", inner, 0..6)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

/// Objects using the concept field names with arbitrary values
fn concept_like() -> impl Strategy<Value = Value> {
    (
        loose_value(),
        loose_value(),
        loose_value(),
        loose_value(),
        loose_value(),
    )
        .prop_map(|(title, benefits, variations, score, markets)| {
            json!({
                "title": title,
                "benefits": benefits,
                "variations": variations,
                "opportunityScore": score,
                "markets": markets,
            })
        })
}

proptest! {
    #[test]
    fn concept_fields_always_in_shape(value in concept_like(), fenced in any::<bool>()) {
        let defaults = GenerationDefaults::default();
        let raw = if fenced {
            format!("Here you go:\n```json\n{}\n```", value)
        } else {
            value.to_string()
        };
        let concept = coerce_record::<Concept>(&raw, &defaults).unwrap().value;
        prop_assert!(!concept.title.trim().is_empty());
        prop_assert!(BENEFIT_ARITY.contains(concept.benefits.len()));
        prop_assert!(VARIATION_ARITY.contains(concept.variations.len()));
        prop_assert!(OPPORTUNITY_SCORE_RANGE.contains(&concept.opportunity_score));
        let ids: Vec<_> = concept.markets.iter().map(|m| m.id.as_str()).collect();
        prop_assert_eq!(ids, vec!["USA", "JPN", "DEU"]);
    }

    #[test]
    fn coercing_coerced_output_is_a_no_op(value in concept_like()) {
        let defaults = GenerationDefaults::default();
        let once = coerce_record::<Concept>(&value.to_string(), &defaults).unwrap().value;
        let serialized = serde_json::to_string(&once).unwrap();
        let twice = coerce_record::<Concept>(&serialized, &defaults).unwrap();
        prop_assert_eq!(&twice.value, &once);
        prop_assert!(!twice.is_partial());
    }

    #[test]
    fn record_lists_have_exact_arity(items in prop::collection::vec(loose_value(), 0..9), n in 1usize..7) {
        let defaults = GenerationDefaults::default();
        let raw = json!({ "insights": items }).to_string();
        if let Some(coerced) = coerce_records::<Insight>(&raw, ListArity::exactly(n), &defaults) {
            prop_assert_eq!(coerced.value.len(), n);
            for insight in &coerced.value {
                prop_assert!((2..=3).contains(&insight.evidence.len()));
                prop_assert!(insight.confidence <= 100);
            }
        }
    }

    #[test]
    fn persona_age_is_clamped(age in any::<i64>()) {
        let defaults = GenerationDefaults::default();
        let raw = json!({"personas": [{"name": "Kim", "age": age}]}).to_string();
        let personas = coerce_records::<PersonaCard>(&raw, ListArity::exactly(5), &defaults)
            .unwrap()
            .value;
        prop_assert!(personas.iter().all(|p| (18..=90).contains(&p.age)));
    }

    #[test]
    fn arbitrary_text_never_panics(raw in "\\PC{0,200}") {
        let defaults = GenerationDefaults::default();
        let _ = coerce_record::<Concept>(&raw, &defaults);
        let _ = coerce_records::<Insight>(&raw, ListArity::exactly(4), &defaults);
    }
}
