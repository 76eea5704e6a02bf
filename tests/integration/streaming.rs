//! Streamed insights through the public pipeline

use super::test_utils::{offline_pipeline, pipeline_with, sse_delta, ScriptedImages, ScriptedText};
use ideagen::records::{Insight, INSIGHT_COUNT};
use ideagen::stream::{ChannelObserver, ObserverSignal, StreamEvent, StreamOutcome};
use ideagen::{ApiError, GenerationFault};
use std::sync::Arc;

const PAYLOAD: &str = r#"{"insights": [{"title": "Noise", "statement": "Open offices are loud",
"evidence": ["Survey", "Interviews"], "confidence": 80}]}"#;

/// The payload cut into deltas, each delta frame split across two reads.
fn chunked_payload() -> Vec<String> {
    let mut reads = vec!["event: stage\ndata: {\"stage\": \"analysing\"}\n\n".to_string()];
    let chars: Vec<char> = PAYLOAD.chars().collect();
    for piece in chars.chunks(17) {
        let frame = sse_delta(&piece.iter().collect::<String>());
        let (head, tail) = frame.split_at(frame.len() / 2);
        reads.push(head.to_string());
        reads.push(tail.to_string());
    }
    reads.push("data: [DONE]\n\n".to_string());
    reads
}

#[tokio::test]
async fn streamed_insights_match_the_payload() {
    let reads = chunked_payload();
    let refs: Vec<&str> = reads.iter().map(String::as_str).collect();
    let text = Arc::new(ScriptedText::new().streaming(&refs));
    let pipeline = pipeline_with(text, Arc::new(ScriptedImages::default()));
    let (mut observer, mut receiver) = ChannelObserver::channel();

    let outcome = pipeline.stream_insights("Offices", &mut observer).await.unwrap();
    drop(observer);

    let StreamOutcome::Done(outcome) = outcome else {
        panic!("stream should finish");
    };
    assert_eq!(outcome.value.len(), INSIGHT_COUNT);
    assert_eq!(outcome.value[0].title, "Noise");
    assert_eq!(outcome.value[0].confidence, 80);

    let mut streamed = String::new();
    let mut stages = Vec::new();
    let mut final_value = None;
    while let Some(event) = receiver.recv().await {
        match event {
            StreamEvent::Stage(label) => stages.push(label),
            StreamEvent::Chunk { text, accumulated_len } => {
                streamed.push_str(&text);
                assert_eq!(accumulated_len, streamed.len());
            }
            StreamEvent::Final(value) => final_value = Some(value),
            StreamEvent::Failed(reason) => panic!("unexpected failure: {}", reason),
        }
    }
    assert_eq!(stages, vec!["analysing".to_string()]);
    assert_eq!(streamed, PAYLOAD);
    assert_eq!(final_value, Some(outcome.value));
}

#[tokio::test]
async fn abandoning_after_first_chunk_stops_the_stream() {
    let reads = chunked_payload();
    let refs: Vec<&str> = reads.iter().map(String::as_str).collect();
    let text = Arc::new(ScriptedText::new().streaming(&refs));
    let pipeline = pipeline_with(text, Arc::new(ScriptedImages::default()));

    let mut chunks = 0;
    let mut observer = |event: StreamEvent<Vec<Insight>>| match event {
        StreamEvent::Chunk { .. } => {
            chunks += 1;
            ObserverSignal::Abandon
        }
        _ => ObserverSignal::Continue,
    };
    let outcome = pipeline.stream_insights("Offices", &mut observer).await.unwrap();

    assert_eq!(outcome, StreamOutcome::Abandoned);
    assert_eq!(chunks, 1);
}

#[tokio::test]
async fn offline_stream_falls_back() {
    let pipeline = offline_pipeline();
    let mut observer = |_event: StreamEvent<Vec<Insight>>| ObserverSignal::Continue;

    let outcome = pipeline
        .stream_insights("Offices", &mut observer)
        .await
        .unwrap()
        .into_outcome()
        .unwrap();

    assert_eq!(outcome.fault(), Some(GenerationFault::ServiceUnconfigured));
    assert_eq!(outcome.value.len(), INSIGHT_COUNT);
}

#[tokio::test]
async fn blank_scope_is_rejected() {
    let pipeline = offline_pipeline();
    let mut observer = |_event: StreamEvent<Vec<Insight>>| ObserverSignal::Continue;
    let result = pipeline.stream_insights(" ", &mut observer).await;
    assert!(matches!(result, Err(ApiError::MissingInput("scope"))));
}
