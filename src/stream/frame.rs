//! Server-sent event framing.
//!
//! Bytes are buffered until a full frame terminator (`\n\n` or `\r\n\r\n`) arrives, so
//! frames and UTF-8 sequences split across reads decode the same as unsplit input.

use serde_json::Value;

const DONE_SENTINEL: &str = "[DONE]";
const STOP_EVENT: &str = "message_stop";
const STAGE_EVENT: &str = "stage";
const ERROR_EVENT: &str = "error";

/// One complete server-sent event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFrame {
    pub event: Option<String>,
    /// `data:` lines joined with `\n`
    pub data: String,
}

impl RawFrame {
    /// Parse the text of one frame. Frames with neither an event nor data are `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut event = None;
        let mut data: Vec<&str> = Vec::new();
        for line in text.lines() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            let (field, value) = match line.find(':') {
                Some(colon) => (&line[..colon], &line[colon + 1..]),
                None => (line, ""),
            };
            let value = value.strip_prefix(' ').unwrap_or(value);
            match field {
                "event" => event = Some(value.trim().to_string()),
                "data" => data.push(value),
                _ => {}
            }
        }
        if event.is_none() && data.is_empty() {
            return None;
        }
        Some(RawFrame {
            event,
            data: data.join("\n"),
        })
    }
}

/// What a frame means to the aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalFrame {
    Chunk(String),
    Stage(String),
    End,
    Error(String),
    Ignored,
}

impl LogicalFrame {
    pub fn classify(frame: &RawFrame) -> Self {
        let event = frame.event.as_deref().unwrap_or("");
        let data = frame.data.trim();

        if event == STOP_EVENT || data == DONE_SENTINEL {
            return LogicalFrame::End;
        }

        let json = serde_json::from_str::<Value>(data).ok();
        if event == ERROR_EVENT {
            let message = json
                .as_ref()
                .and_then(error_message)
                .unwrap_or_else(|| data.to_string());
            return LogicalFrame::Error(message);
        }
        if event == STAGE_EVENT {
            let label = json
                .as_ref()
                .and_then(stage_label)
                .unwrap_or_else(|| data.to_string());
            return non_empty(label, LogicalFrame::Stage);
        }

        match json {
            Some(value @ (Value::Object(_) | Value::Array(_))) => Self::classify_json(&value),
            // A bare JSON string is still text.
            Some(Value::String(text)) => non_empty(text, LogicalFrame::Chunk),
            _ if data.is_empty() => LogicalFrame::Ignored,
            _ => LogicalFrame::Chunk(frame.data.clone()),
        }
    }

    fn classify_json(value: &Value) -> Self {
        if let Some(message) = error_message(value) {
            return LogicalFrame::Error(message);
        }
        if let Some(label) = stage_label(value) {
            return non_empty(label, LogicalFrame::Stage);
        }
        // OpenAI-compatible
        if let Some(text) = value
            .pointer("/choices/0/delta/content")
            .and_then(Value::as_str)
        {
            return non_empty(text.to_string(), LogicalFrame::Chunk);
        }
        // Anthropic content_block_delta
        if let Some(text) = value.pointer("/delta/text").and_then(Value::as_str) {
            return non_empty(text.to_string(), LogicalFrame::Chunk);
        }
        // Ollama
        if let Some(text) = value.pointer("/message/content").and_then(Value::as_str) {
            return non_empty(text.to_string(), LogicalFrame::Chunk);
        }
        if value.get("type").and_then(Value::as_str) == Some(STOP_EVENT) {
            return LogicalFrame::End;
        }
        LogicalFrame::Ignored
    }
}

fn non_empty(text: String, make: fn(String) -> LogicalFrame) -> LogicalFrame {
    if text.is_empty() {
        LogicalFrame::Ignored
    } else {
        make(text)
    }
}

fn stage_label(value: &Value) -> Option<String> {
    let label = value
        .get("stage")
        .or_else(|| value.get("label"))
        .and_then(Value::as_str)?;
    let label = label.trim();
    (!label.is_empty()).then(|| label.to_string())
}

fn error_message(value: &Value) -> Option<String> {
    let error = value.get("error")?;
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    Some(message)
}

/// Incremental byte-level frame splitter
#[derive(Debug, Default)]
pub struct FrameDecoder {
    leftover: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes received but not yet part of a complete frame.
    pub fn leftover(&self) -> &[u8] {
        &self.leftover
    }

    /// Append `bytes` and return every frame completed by them, in order.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<RawFrame> {
        self.leftover.extend_from_slice(bytes);
        let mut frames = Vec::new();
        while let Some((end, terminator_len)) = find_terminator(&self.leftover) {
            let rest = self.leftover.split_off(end + terminator_len);
            let mut frame_bytes = std::mem::replace(&mut self.leftover, rest);
            frame_bytes.truncate(end);
            if let Some(frame) = RawFrame::parse(&String::from_utf8_lossy(&frame_bytes)) {
                frames.push(frame);
            }
        }
        frames
    }

    /// End of input: whatever is buffered becomes a final frame.
    pub fn finish(&mut self) -> Option<RawFrame> {
        let remainder = std::mem::take(&mut self.leftover);
        RawFrame::parse(&String::from_utf8_lossy(&remainder))
    }
}

/// Earliest frame terminator: `(start, length)`.
fn find_terminator(bytes: &[u8]) -> Option<(usize, usize)> {
    let lf = find(bytes, b"\n\n").map(|i| (i, 2));
    let crlf = find(bytes, b"\r\n\r\n").map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
