//! Getting a structured value out of agent text.
//!
//! Agents wrap JSON in code fences, add prose around it, leave trailing commas, or
//! double-encode it as a JSON string. Each repair here is tried in order; if none
//! yields a value the text is unparseable and callers fall back.

use serde_json::Value;

const FENCE: &str = "```";

/// Strip one optional leading fence line (with its language tag) and one trailing fence.
pub fn strip_fence(raw: &str) -> &str {
    let mut body = raw.trim().trim_start_matches('\u{feff}').trim();
    if let Some(rest) = body.strip_prefix(FENCE) {
        body = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            // Single-line fence: drop the language tag if one is glued on.
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }
    if let Some(rest) = body.trim_end().strip_suffix(FENCE) {
        body = rest;
    }
    body.trim()
}

/// Parse agent text into a JSON value, or `None` when nothing parseable is found.
pub fn parse_candidate(raw: &str) -> Option<Value> {
    let body = strip_fence(raw);
    if body.is_empty() {
        return None;
    }
    if let Some(value) = parse_and_unquote(body) {
        return Some(value);
    }

    let repaired = strip_trailing_commas(body);
    if let Some(value) = parse_and_unquote(&repaired) {
        return Some(value);
    }

    // Prose around the payload, possibly with a fence in the middle of it.
    let inner = match repaired.find(FENCE) {
        Some(_) => embedded_fence(&repaired).unwrap_or(&repaired),
        None => &repaired,
    };
    outermost_span(inner).and_then(parse_and_unquote)
}

/// Plain text answer (image prompts): unfenced, unquoted, non-empty.
pub fn plain_text(raw: &str) -> Option<String> {
    let body = strip_fence(raw);
    let text = match serde_json::from_str::<Value>(body) {
        Ok(Value::String(text)) => text,
        Ok(Value::Object(map)) => map
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("prompt"))
            .and_then(|(_, value)| value.as_str())
            .map(str::to_string)
            .unwrap_or_default(),
        _ => body.to_string(),
    };
    let text = text
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '“' || c == '”')
        .trim()
        .to_string();
    (!text.is_empty()).then_some(text)
}

fn parse_and_unquote(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        // Double-encoded payloads arrive as a JSON string holding JSON.
        Ok(Value::String(inner)) => {
            let inner = inner.trim();
            if inner.starts_with('{') || inner.starts_with('[') {
                serde_json::from_str(inner).ok()
            } else {
                Some(Value::String(inner.to_string()))
            }
        }
        Ok(value) => Some(value),
        Err(_) => None,
    }
}

fn embedded_fence(text: &str) -> Option<&str> {
    let open = text.find(FENCE)?;
    let after_open = &text[open + FENCE.len()..];
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_open[body_start..];
    let close = body.find(FENCE)?;
    Some(&body[..close])
}

/// Remove commas that directly precede `}` or `]`, leaving string contents untouched.
pub fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// The first balanced `{…}` or `[…]` span, skipping brackets inside strings.
pub fn outermost_span(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c == '{' || c == '[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fenced_json_is_unwrapped() {
        let raw = "```json\n{\"title\": \"A\"}\n```";
        assert_eq!(parse_candidate(raw), Some(json!({"title": "A"})));
    }

    #[test]
    fn bare_fence_without_language() {
        let raw = "```\n[1, 2]\n```\n";
        assert_eq!(parse_candidate(raw), Some(json!([1, 2])));
    }

    #[test]
    fn prose_around_payload() {
        let raw = "Sure! Here is the concept:\n{\"title\": \"A\", \"tags\": [\"x\"]}\nHope this helps.";
        assert_eq!(
            parse_candidate(raw),
            Some(json!({"title": "A", "tags": ["x"]}))
        );
    }

    #[test]
    fn fence_in_the_middle_of_prose() {
        let raw = "Here you go:\n```json\n{\"a\": 1,}\n```\nThanks";
        assert_eq!(parse_candidate(raw), Some(json!({"a": 1})));
    }

    #[test]
    fn trailing_commas_are_dropped_outside_strings() {
        let repaired = strip_trailing_commas("{\"a\": [1, 2,], \"b\": \"x,]\",}");
        assert_eq!(repaired, "{\"a\": [1, 2], \"b\": \"x,]\"}");
    }

    #[test]
    fn double_encoded_json() {
        let raw = "\"{\\\"a\\\": 1}\"";
        assert_eq!(parse_candidate(raw), Some(json!({"a": 1})));
    }

    #[test]
    fn garbage_is_unparseable() {
        assert_eq!(parse_candidate("I cannot help with that."), None);
        assert_eq!(parse_candidate(""), None);
        assert_eq!(parse_candidate("```json\n```"), None);
        assert_eq!(parse_candidate("{\"a\": [1, 2"), None);
    }

    #[test]
    fn span_ignores_brackets_in_strings() {
        assert_eq!(
            outermost_span("x {\"a\": \"}\"} y"),
            Some("{\"a\": \"}\"}")
        );
    }

    #[test]
    fn plain_text_strips_quotes_and_fences() {
        assert_eq!(
            plain_text("```\n\"A sunlit kitchen\"\n```").as_deref(),
            Some("A sunlit kitchen")
        );
        assert_eq!(
            plain_text("{\"prompt\": \"Studio portrait\"}").as_deref(),
            Some("Studio portrait")
        );
        assert_eq!(plain_text("  \"\" "), None);
    }
}
