//! Turning raw model replies into script descriptors or plain code.

use serde_json::Value;

use super::{normalize_scripts, ScriptDescriptor};

/// Extract script descriptors from a model reply. Never fails: replies without
/// usable JSON come back as a single script holding the trimmed reply text.
pub fn extract_scripts(reply: &str) -> Vec<ScriptDescriptor> {
    if let Ok(value) = serde_json::from_str::<Value>(reply) {
        return normalize_scripts(&value);
    }

    if let Some(value) = embedded_json(reply) {
        tracing::debug!("recovered JSON embedded in model reply");
        return normalize_scripts(&value);
    }

    tracing::debug!("no JSON in model reply, returning it as raw code");
    vec![ScriptDescriptor::placeholder(reply.trim())]
}

/// First balanced bracket span in `text` that parses as JSON.
///
/// One pass over the bytes, honoring string literals and escapes. A span that
/// closes with the wrong bracket or doesn't parse is dropped and the scan
/// resumes right after it, so the work stays linear in the reply length.
fn embedded_json(text: &str) -> Option<Value> {
    let mut expected: Vec<u8> = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;

    // Brackets and quotes are ASCII, so byte offsets always land on char boundaries.
    for (pos, &byte) in text.as_bytes().iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            // Quotes only matter inside a span; prose outside is ignored.
            b'"' if !expected.is_empty() => in_string = true,
            b'{' | b'[' => {
                if expected.is_empty() {
                    start = pos;
                }
                expected.push(if byte == b'{' { b'}' } else { b']' });
            }
            b'}' | b']' if !expected.is_empty() => {
                if expected.pop() != Some(byte) {
                    expected.clear();
                    continue;
                }
                if expected.is_empty() {
                    if let Ok(value) = serde_json::from_str::<Value>(&text[start..=pos]) {
                        return Some(value);
                    }
                }
            }
            _ => {}
        }
    }
    None
}

/// Language tags dropped from an opening fence even when code follows on the same line.
const FENCE_TAGS: [&str; 2] = ["lua", "luau"];

/// Strip one leading and one trailing Markdown code fence, then trim.
///
/// The opening fence may carry a language tag (```` ```lua ````, ```` ```luau ````).
/// A fence glued to code (```` ```print(1)``` ````) keeps everything after the backticks.
pub fn strip_code_fences(reply: &str) -> String {
    let mut body = reply.trim();

    if let Some(rest) = body.strip_prefix("```") {
        let tag_end = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        let (tag, after_tag) = rest.split_at(tag_end);
        let known_tag = FENCE_TAGS.iter().any(|t| tag.eq_ignore_ascii_case(t));
        body = if known_tag || after_tag.is_empty() || after_tag.starts_with(['\n', '\r']) {
            after_tag
        } else {
            rest
        };
    }

    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }

    body.trim().to_string()
}
