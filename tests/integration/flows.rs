//! Opportunity, insight, persona, project and validation flows

use super::test_utils::{
    offline_pipeline, pipeline_with, Reply, ScriptedImages, ScriptedText, HEADSHOTS, IMAGE_PROMPT,
    INSIGHTS, OPPORTUNITY_SPACE, PERSONAS, VALIDATION,
};
use ideagen::pipeline::flows::{ENRICHED_SPACE_COUNT, OPPORTUNITY_SPACE_COUNT};
use ideagen::records::{Insight, PERSONA_COUNT};
use ideagen::{ApiError, GenerationFault};
use serde_json::json;
use std::sync::Arc;

fn insights() -> Vec<Insight> {
    (1..=4)
        .map(|i| Insight {
            title: format!("Insight {}", i),
            statement: "People want calm".to_string(),
            evidence: vec!["Survey".to_string(), "Interviews".to_string()],
            confidence: 70,
        })
        .collect()
}

fn space(title: &str) -> String {
    json!({
        "title": title,
        "summary": "Summary",
        "themes": ["a", "b", "c"],
        "targetUsers": ["Commuters"],
        "opportunityScore": 60
    })
    .to_string()
}

#[tokio::test]
async fn opportunity_spaces_keep_angle_order_and_enrich_first_two() {
    let text = Arc::new(
        ScriptedText::new()
            .on(IMAGE_PROMPT, Reply::Text("a scene".to_string()))
            .on_all(&[OPPORTUNITY_SPACE, "Angle 1 of 4"], Reply::Delayed(40, space("First")))
            .on_all(&[OPPORTUNITY_SPACE, "Angle 2 of 4"], Reply::Delayed(5, space("Second")))
            .on_all(&[OPPORTUNITY_SPACE, "Angle 3 of 4"], Reply::Delayed(25, space("Third")))
            .on_all(&[OPPORTUNITY_SPACE, "Angle 4 of 4"], Reply::Status(429)),
    );
    let images = Arc::new(ScriptedImages::default());
    let pipeline = pipeline_with(text, images.clone());

    let spaces = pipeline.generate_opportunity_spaces(&insights()).await.unwrap();

    assert_eq!(spaces.len(), OPPORTUNITY_SPACE_COUNT);
    let titles: Vec<_> = spaces.iter().map(|s| s.value.title.as_str()).collect();
    assert_eq!(&titles[..3], &["First", "Second", "Third"]);
    assert_eq!(spaces[3].fault(), Some(GenerationFault::NonSuccessStatus));
    assert!(spaces[..ENRICHED_SPACE_COUNT].iter().all(|s| s.value.image_url.is_some()));
    assert!(spaces[ENRICHED_SPACE_COUNT..].iter().all(|s| s.value.image_url.is_none()));
    assert_eq!(images.prompts().len(), ENRICHED_SPACE_COUNT);
}

#[tokio::test]
async fn insights_are_exactly_four() {
    let text = Arc::new(ScriptedText::new().on(
        INSIGHTS,
        Reply::json(json!([
            {"title": "A", "statement": "s", "evidence": ["x"], "confidence": 150},
            {"title": "B", "statement": "s", "evidence": ["x", "y"], "confidence": "40"}
        ])),
    ));
    let pipeline = pipeline_with(text, Arc::new(ScriptedImages::default()));

    let outcome = pipeline.generate_insights("Commuting").await.unwrap();

    assert_eq!(outcome.value.len(), 4);
    assert_eq!(outcome.value[0].confidence, 100);
    assert_eq!(outcome.value[1].confidence, 40);
    assert!(outcome.value.iter().all(|i| (2..=3).contains(&i.evidence.len())));
    assert_eq!(outcome.fault(), Some(GenerationFault::PartialFieldDefaulted));
}

#[tokio::test]
async fn personas_with_headshots() {
    let personas: Vec<_> = (0..PERSONA_COUNT)
        .map(|i| {
            json!({
                "name": format!("Person {}", i),
                "role": "Nurse",
                "quote": "Busy days",
                "goals": ["g1", "g2", "g3"],
                "frustrations": ["f1", "f2", "f3"],
                "age": 300
            })
        })
        .collect();
    let text = Arc::new(
        ScriptedText::new()
            .on(PERSONAS, Reply::json(json!({ "personas": personas })))
            .on(
                HEADSHOTS,
                Reply::json(json!({"prompts": ["p0", "p1", "p2 BLOCKED", "p3"]})),
            ),
    );
    let images = Arc::new(ScriptedImages::failing_on(&["BLOCKED"]));
    let pipeline = pipeline_with(text, images.clone());

    let mut outcome = pipeline.generate_personas("Hospital shifts").await.unwrap();
    assert_eq!(outcome.value.len(), PERSONA_COUNT);
    assert!(outcome.value.iter().all(|p| p.age == 90));

    pipeline
        .generate_persona_headshots(&mut outcome.value)
        .await
        .unwrap();
    let with_image: Vec<bool> = outcome.value.iter().map(|p| p.image_url.is_some()).collect();
    assert_eq!(with_image, vec![true, true, false, true, false]);
    // Only the four prompts that exist reach the image service.
    assert_eq!(images.prompts().len(), 4);
}

#[tokio::test]
async fn project_detail_is_two_by_three_or_four() {
    let pipeline = offline_pipeline();
    let outcome = pipeline.generate_project_detail("Urban farming").await.unwrap();
    assert_eq!(outcome.value.opportunities.len(), 2);
    assert!(outcome
        .value
        .opportunities
        .iter()
        .all(|o| (3..=4).contains(&o.concepts.len())));
}

#[tokio::test]
async fn validation_covers_each_requested_market() {
    let text = Arc::new(ScriptedText::new().on(
        VALIDATION,
        Reply::json(json!({"validations": [
            {"market": "Deutschland", "alignment": "medium", "score": 55, "verdict": "Maybe"}
        ]})),
    ));
    let pipeline = pipeline_with(text, Arc::new(ScriptedImages::default()));
    let concept = ideagen::coerce::coerce_record::<ideagen::records::Concept>(
        r#"{"title": "Tool library"}"#,
        pipeline.defaults(),
    )
    .unwrap()
    .value;

    let outcome = pipeline
        .validate_concept(&concept, &["deu".to_string(), "usa".to_string()])
        .await
        .unwrap();

    assert_eq!(outcome.value.len(), 2);
    assert_eq!(outcome.value[0].market_id, "DEU");
    assert_eq!(outcome.value[0].score, 55);
    assert_eq!(outcome.value[1].market_id, "USA");
    assert_eq!(outcome.value[1].score, pipeline.defaults().validation.score);
}

#[tokio::test]
async fn unknown_market_is_invalid_input() {
    let pipeline = offline_pipeline();
    let concept = ideagen::coerce::coerce_record::<ideagen::records::Concept>(
        r#"{"title": "x"}"#,
        pipeline.defaults(),
    )
    .unwrap()
    .value;
    let err = pipeline
        .validate_concept(&concept, &["Atlantis".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(ref msg) if msg.contains("Atlantis")));
}
