//! Seed-then-detail and fan-out behaviour through the public pipeline

use super::test_utils::{
    offline_pipeline, pipeline_with, seeds_reply, Reply, ScriptedImages, ScriptedText,
    CONCEPT_DETAIL, IDEATION, IMAGE_PROMPT,
};
use ideagen::fanout::ProgressSink;
use ideagen::pipeline::SEED_COUNT;
use ideagen::ApiError;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<(String, Value)>>,
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event_type: &str, payload: Value) {
        self.events.lock().push((event_type.to_string(), payload));
    }
}

#[tokio::test]
async fn failed_details_keep_their_seed_identity() {
    let titles = ["Tool library", "Seed swap", "Repair cafe", "Bike kitchen", "Toy loop"];
    let text = Arc::new(
        ScriptedText::new()
            .on(IDEATION, seeds_reply(&titles))
            .on_all(&[CONCEPT_DETAIL, "Title: Seed swap"], Reply::Status(503))
            .on_all(&[CONCEPT_DETAIL, "Title: Bike kitchen"], Reply::Text("not json".to_string()))
            .on(
                CONCEPT_DETAIL,
                Reply::json(json!({"title": "Ignored", "opportunityScore": 72})),
            )
            .on(IMAGE_PROMPT, Reply::Text("photo".to_string())),
    );
    let pipeline = pipeline_with(text, Arc::new(ScriptedImages::default()));

    let concepts = pipeline.seed_then_detail("Circular economy", SEED_COUNT).await;

    assert_eq!(concepts.len(), SEED_COUNT);
    for (concept, title) in concepts.iter().zip(titles) {
        assert_eq!(concept.value.title, title);
        assert_eq!(concept.value.summary, format!("{} pitch", title));
    }
    assert!(concepts[1].is_fallback());
    assert!(concepts[3].is_fallback());
    assert_eq!(concepts[0].value.opportunity_score, 72);
    assert_eq!(concepts[1].value.opportunity_score, 65);
}

#[tokio::test]
async fn short_ideation_pads_with_placeholder_seeds() {
    let text = Arc::new(
        ScriptedText::new()
            .on(IDEATION, seeds_reply(&["Only one"]))
            .on(CONCEPT_DETAIL, Reply::json(json!({"opportunityScore": 90}))),
    );
    let pipeline = pipeline_with(text, Arc::new(ScriptedImages::default()));

    let concepts = pipeline.seed_then_detail("Anything", SEED_COUNT).await;

    assert_eq!(concepts[0].value.title, "Only one");
    assert_eq!(concepts[0].value.opportunity_score, 90);
    for concept in &concepts[1..] {
        assert_eq!(concept.value.title, "Concept (generation pending)");
        assert_eq!(concept.value.opportunity_score, 65);
    }
}

#[tokio::test]
async fn progress_events_cover_every_item() {
    let sink = Arc::new(RecordingSink::default());
    let pipeline = offline_pipeline().with_progress(sink.clone());

    pipeline.generate_concepts("Anything").await.unwrap();

    let events = sink.events.lock();
    let batches: Vec<&str> = events
        .iter()
        .filter(|(kind, _)| kind == "batch_completed")
        .filter_map(|(_, payload)| payload["batch"].as_str())
        .collect();
    assert_eq!(batches, vec!["concept_detail", "visual_enrichment"]);
    let settled = events.iter().filter(|(kind, _)| kind == "item_settled").count();
    assert_eq!(settled, 2 * SEED_COUNT);
}

#[tokio::test]
async fn blank_opportunity_makes_no_calls() {
    let text = Arc::new(ScriptedText::new());
    let pipeline = pipeline_with(text.clone(), Arc::new(ScriptedImages::default()));

    let result = pipeline.generate_concepts("\n  \t").await;

    assert!(matches!(result, Err(ApiError::MissingInput(_))));
    assert_eq!(text.total_calls(), 0);
}
