//! End-to-end degradation scenarios for the concept flow

use super::test_utils::{
    pipeline_with, seeds_reply, Reply, ScriptedImages, ScriptedText, CONCEPT_DETAIL, IDEATION,
    IMAGE_PROMPT,
};
use ideagen::coerce::Alignment;
use ideagen::records::concept::BENEFIT_ARITY;
use ideagen::GenerationFault;
use serde_json::json;
use std::sync::Arc;

const SEEDS: [&str; 5] = ["Alpha kit", "Bravo club", "Charlie cart", "Delta desk", "Echo app"];

fn detail_reply(score: serde_json::Value) -> Reply {
    Reply::json(json!({
        "title": "Agent title",
        "summary": "Agent summary",
        "description": "A detailed description.",
        "benefits": ["One", "Two", "Three"],
        "variations": ["Small", "Large"],
        "opportunityScore": score,
        "keyword": "product"
    }))
}

/// Ideation times out: five placeholder concepts, score 65.
#[tokio::test]
async fn scenario_a_ideation_timeout_yields_placeholders() {
    let text = Arc::new(
        ScriptedText::new()
            .on(IDEATION, Reply::Timeout)
            .on(IMAGE_PROMPT, Reply::Text("a product photo".to_string()))
            .on(CONCEPT_DETAIL, detail_reply(json!(88))),
    );
    let pipeline = pipeline_with(text.clone(), Arc::new(ScriptedImages::default()));

    let concepts = pipeline.generate_concepts("Quiet offices").await.unwrap();

    assert_eq!(concepts.len(), 5);
    for concept in &concepts {
        assert_eq!(concept.value.title, "Concept (generation pending)");
        assert_eq!(concept.value.opportunity_score, 65);
        assert_eq!(concept.value.benefits.len(), BENEFIT_ARITY.min);
    }
    // Detail still ran once per placeholder seed.
    assert_eq!(text.calls_containing(CONCEPT_DETAIL), 5);
}

#[tokio::test]
async fn scenario_a_everything_down_still_yields_five() {
    let text = Arc::new(ScriptedText::new().on(IDEATION, Reply::Timeout));
    let pipeline = pipeline_with(text, Arc::new(ScriptedImages::default()));

    let concepts = pipeline.generate_concepts("Quiet offices").await.unwrap();

    assert_eq!(concepts.len(), 5);
    assert!(concepts.iter().all(|c| c.is_fallback()));
    assert!(concepts
        .iter()
        .all(|c| c.fault() == Some(GenerationFault::NonSuccessStatus)));
    assert!(concepts.iter().all(|c| c.value.opportunity_score == 65));
    assert!(concepts.iter().all(|c| c.value.image_url.is_none()));
}

/// Out-of-range score is clamped, never rejected.
#[tokio::test]
async fn scenario_b_score_is_clamped() {
    let text = Arc::new(
        ScriptedText::new()
            .on(IDEATION, seeds_reply(&SEEDS))
            .on(IMAGE_PROMPT, Reply::Text("a product photo".to_string()))
            .on(CONCEPT_DETAIL, detail_reply(json!(140))),
    );
    let pipeline = pipeline_with(text, Arc::new(ScriptedImages::default()));

    let concepts = pipeline.generate_concepts("Quiet offices").await.unwrap();

    assert!(concepts.iter().all(|c| c.value.opportunity_score == 95));
    assert!(concepts.iter().all(|c| !c.is_fallback()));
    for (concept, seed) in concepts.iter().zip(SEEDS) {
        assert_eq!(concept.value.title, seed);
        assert_eq!(concept.value.summary, format!("{} pitch", seed));
    }
}

/// Partial market list is aligned to the canonical set.
#[tokio::test]
async fn scenario_c_markets_are_aligned_to_canonical_set() {
    let detail = Reply::json(json!({
        "description": "Described",
        "markets": [
            {"market": "Brazil", "alignment": "high", "nuances": ["Carnival"]},
            {"market": "usa", "alignment": "low", "nuances": ["Price sensitive"]}
        ]
    }));
    let text = Arc::new(
        ScriptedText::new()
            .on(IDEATION, seeds_reply(&SEEDS))
            .on(IMAGE_PROMPT, Reply::Text("a product photo".to_string()))
            .on(CONCEPT_DETAIL, detail),
    );
    let pipeline = pipeline_with(text, Arc::new(ScriptedImages::default()));
    let catalog = &pipeline.defaults().markets;

    let concepts = pipeline.generate_concepts("Quiet offices").await.unwrap();

    for concept in &concepts {
        let markets = &concept.value.markets;
        let ids: Vec<_> = markets.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["USA", "JPN", "DEU"]);
        assert_eq!(markets[0].alignment, Alignment::Low);
        assert_eq!(markets[0].nuances, vec!["Price sensitive".to_string()]);
        assert_eq!(markets[1], catalog.markets[1].to_default_market());
        assert_eq!(markets[2], catalog.markets[2].to_default_market());
        assert_eq!(concept.fault(), Some(GenerationFault::PartialFieldDefaulted));
    }
}

/// One image failure leaves only that concept without an image.
#[tokio::test]
async fn scenario_d_single_image_failure_is_isolated() {
    let text = Arc::new(
        ScriptedText::new()
            .on(IDEATION, seeds_reply(&SEEDS))
            .on_all(
                &[IMAGE_PROMPT, "Title: Charlie cart"],
                Reply::Text("a cart, BLOCKED".to_string()),
            )
            .on(IMAGE_PROMPT, Reply::Text("a product photo".to_string()))
            .on(CONCEPT_DETAIL, detail_reply(json!(70))),
    );
    let images = Arc::new(ScriptedImages::failing_on(&["BLOCKED"]));
    let pipeline = pipeline_with(text, images.clone());

    let concepts = pipeline.generate_concepts("Quiet offices").await.unwrap();

    let with_image: Vec<bool> = concepts.iter().map(|c| c.value.image_url.is_some()).collect();
    assert_eq!(with_image, vec![true, true, false, true, true]);
    assert_eq!(images.prompts().len(), 5);
    assert!(pipeline.display_image(&concepts[2]).contains("source.unsplash.com"));
}
