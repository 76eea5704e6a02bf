//! Stream decoding is independent of how the bytes are split into reads

use ideagen::stream::{FrameDecoder, RawFrame, StreamMachine, StreamStep};
use proptest::prelude::*;
use serde_json::json;

fn frame_text() -> impl Strategy<Value = String> {
    // No line breaks inside a frame's data; anything else goes, including multi-byte text.
    "[^\r\n]{0,40}"
}

fn encode(frames: &[(Option<String>, String)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (event, data) in frames {
        if let Some(event) = event {
            bytes.extend_from_slice(format!("event: {}\n", event).as_bytes());
        }
        bytes.extend_from_slice(format!("data: {}\n\n", data).as_bytes());
    }
    bytes
}

/// Cut `bytes` at the given (sorted, deduplicated) positions.
fn split_at_points(bytes: &[u8], points: &[usize]) -> Vec<Vec<u8>> {
    let mut cuts: Vec<usize> = points.iter().map(|p| p % (bytes.len() + 1)).collect();
    cuts.sort_unstable();
    cuts.dedup();
    let mut reads = Vec::new();
    let mut start = 0;
    for cut in cuts {
        reads.push(bytes[start..cut].to_vec());
        start = cut;
    }
    reads.push(bytes[start..].to_vec());
    reads
}

fn decode(reads: &[Vec<u8>]) -> Vec<RawFrame> {
    let mut decoder = FrameDecoder::new();
    let mut frames: Vec<RawFrame> = reads.iter().flat_map(|read| decoder.push(read)).collect();
    frames.extend(decoder.finish());
    frames
}

proptest! {
    #[test]
    fn frames_survive_any_split(
        frames in prop::collection::vec((prop::option::of("[a-z_]{1,12}"), frame_text()), 0..8),
        points in prop::collection::vec(any::<usize>(), 0..12),
    ) {
        let bytes = encode(&frames);
        let whole = decode(&[bytes.clone()]);
        let split = decode(&split_at_points(&bytes, &points));
        prop_assert_eq!(split, whole);
    }

    #[test]
    fn accumulated_text_survives_any_split(
        pieces in prop::collection::vec("\\PC{1,12}", 1..10),
        points in prop::collection::vec(any::<usize>(), 0..12),
    ) {
        let mut bytes = Vec::new();
        for piece in &pieces {
            let delta = json!({"choices": [{"delta": {"content": piece}}]});
            bytes.extend_from_slice(format!("data: {}\n\n", delta).as_bytes());
        }
        bytes.extend_from_slice(b"data: [DONE]\n\n");

        let mut machine = StreamMachine::new();
        let mut ended = false;
        for read in split_at_points(&bytes, &points) {
            for step in machine.feed(&read) {
                prop_assert!(!matches!(step, StreamStep::Failed(_)));
                ended |= step == StreamStep::End;
            }
        }
        prop_assert!(ended);
        prop_assert_eq!(machine.accumulated(), pieces.concat());
    }
}
