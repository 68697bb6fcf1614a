//! Response Parser: pulls JSON out of free-form LLM output.
//!
//! Models wrap JSON in markdown fences, prepend commentary, or split the
//! answer across several fragments. We scan for balanced `{...}` / `[...]`
//! spans (string contents are opaque), parse each one independently and
//! shallow-merge every object we find. Later fragments win on key clashes.
//!
//! Zero parseable fragments is not an error: the caller gets an empty map and
//! the schema validator fills in defaults.

use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Keys some models wrap the whole answer in.
const ENVELOPE_KEYS: &[&str] = &["message", "response", "data", "result"];

/// Extracts and merges every JSON object embedded in `text`.
pub fn extract_json(text: &str) -> Map<String, Value> {
    let mut merged = Map::new();
    let fragments = json_fragments(text);

    if fragments.is_empty() {
        warn!(
            "No parseable JSON in model output ({} chars), falling back to defaults",
            text.len()
        );
        return merged;
    }

    debug!("Parsed {} JSON fragment(s) from model output", fragments.len());

    for fragment in fragments {
        merge_objects(fragment, &mut merged);
    }

    merged
}

/// Objects merge as-is; arrays, at any depth, contribute their object elements.
fn merge_objects(value: Value, into: &mut Map<String, Value>) {
    match value {
        Value::Object(object) => into.extend(object),
        Value::Array(items) => {
            for item in items {
                merge_objects(item, into);
            }
        }
        _ => {}
    }
}

/// If none of `expected` keys are present and the object is a single-key
/// wrapper like `{"message": {...}}`, returns the inner object.
pub fn unwrap_envelope(mut candidate: Map<String, Value>, expected: &[&str]) -> Map<String, Value> {
    if expected.iter().any(|key| candidate.contains_key(*key)) || candidate.len() != 1 {
        return candidate;
    }

    for key in ENVELOPE_KEYS {
        if matches!(candidate.get(*key), Some(Value::Object(_))) {
            if let Some(Value::Object(inner)) = candidate.remove(*key) {
                debug!("Unwrapped '{key}' envelope from model output");
                return inner;
            }
        }
    }

    candidate
}

/// Returns every successfully parsed top-level JSON span, in order.
fn json_fragments(text: &str) -> Vec<Value> {
    let mut fragments = Vec::new();
    let mut cursor = 0;

    while cursor < text.len() {
        let Some(offset) = text[cursor..].find(['{', '[']) else {
            break;
        };
        let start = cursor + offset;

        match balanced_span_end(text, start) {
            Some(end) => match serde_json::from_str::<Value>(&text[start..end]) {
                Ok(value) => {
                    fragments.push(value);
                    cursor = end;
                }
                // Not JSON as a whole, but something nested inside might be.
                Err(_) => cursor = start + 1,
            },
            None => cursor = start + 1,
        }
    }

    fragments
}

/// Finds the byte index just past the bracket that closes the one at `start`.
/// Brackets inside string literals are ignored.
fn balanced_span_end(text: &str, start: usize) -> Option<usize> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(ch) {
                    return None;
                }
                if stack.is_empty() {
                    return Some(start + offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}
