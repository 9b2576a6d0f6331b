//! Raw-text extraction from provider response bodies.
//!
//! The provider returns generated text in more than one shape depending on
//! API version and response mode. Extraction is an ordered list of
//! strategies tried in sequence; the first that yields non-empty text wins.

use serde_json::Value as JsonValue;

/// Join the `text` fields of a `parts` array, if present.
fn join_parts(parts: &JsonValue) -> Option<String> {
    let parts = parts.as_array()?;
    let text = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join("\n");
    let text = text.trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Top-level `text` field (convenience shape).
fn direct_text(body: &JsonValue) -> Option<String> {
    let text = body.get("text")?.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// `candidates[0].content.parts[]` (generateContent shape).
fn candidate_parts(body: &JsonValue) -> Option<String> {
    join_parts(body.get("candidates")?.get(0)?.get("content")?.get("parts")?)
}

/// `output[0].content.parts[]` (legacy shape).
fn output_parts(body: &JsonValue) -> Option<String> {
    join_parts(body.get("output")?.get(0)?.get("content")?.get("parts")?)
}

/// Extract the generated text from a provider response body.
///
/// Returns `None` when no strategy yields non-empty text; callers treat
/// that as if the call itself failed.
pub fn extract_text(body: &JsonValue) -> Option<String> {
    let strategies: [fn(&JsonValue) -> Option<String>; 3] =
        [direct_text, candidate_parts, output_parts];

    strategies.iter().find_map(|strategy| strategy(body))
}
