//! Extraction of structured payloads from free-form model output.
//!
//! Models are asked to answer with a fenced ```json block, but in practice
//! they wrap it in prose, omit the fence, or add a trailing explanation.
//! Callers get the first JSON value that actually parses.

use serde_json::Value;

/// Extract the first JSON value from model output.
///
/// Tried in order:
/// 1. The whole content
/// 2. Every fenced code block, in order of appearance
/// 3. The first balanced `[...]` or `{...}` found in the prose
pub fn extract_json(content: &str) -> Option<Value> {
    let trimmed = content.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if value.is_object() || value.is_array() {
            return Some(value);
        }
    }

    for block in fenced_blocks(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(block.trim()) {
            return Some(value);
        }
    }

    let mut search_from = 0;
    while let Some(rel) = trimmed[search_from..].find(['[', '{']) {
        let start = search_from + rel;
        if let Some(candidate) = extract_balanced(&trimmed[start..]) {
            if let Ok(value) = serde_json::from_str::<Value>(candidate) {
                return Some(value);
            }
        }
        search_from = start + 1;
    }

    None
}

/// Remove one surrounding markdown fence (```markdown ... ```) if present.
///
/// Used on free-text answers (refined reports, translations) where the model
/// sometimes wraps the whole answer in a fence.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    if !trimmed.starts_with("```") || !trimmed.ends_with("```") || trimmed.len() < 6 {
        return trimmed;
    }
    let inner = &trimmed[3..trimmed.len() - 3];
    match inner.find('\n') {
        Some(newline) => inner[newline + 1..].trim(),
        None => inner.trim(),
    }
}

/// Bodies of all markdown code fences in the text.
///
/// Works even when there is trailing prose after the closing ```.
fn fenced_blocks(content: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = content;

    while let Some(fence_start) = rest.find("```") {
        let after_opening = &rest[fence_start + 3..];

        // Skip the language tag line (e.g. "json\n")
        let Some(newline) = after_opening.find('\n') else {
            break;
        };
        let body = &after_opening[newline + 1..];

        let Some(closing) = body.find("```") else {
            break;
        };
        blocks.push(&body[..closing]);
        rest = &body[closing + 3..];
    }

    blocks
}

/// Extract a balanced JSON array or object starting at position 0 of `s`.
///
/// Counts bracket depth, respecting string literals, to find the matching
/// close bracket.
fn extract_balanced(s: &str) -> Option<&str> {
    let (open, close) = match s.chars().next()? {
        '[' => ('[', ']'),
        '{' => ('{', '}'),
        _ => return None,
    };
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
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
    fn test_raw_json() {
        let value = extract_json(r#"[{"file_name": "a.docx"}]"#).unwrap();
        assert_eq!(value, json!([{"file_name": "a.docx"}]));
    }

    #[test]
    fn test_fenced_json_with_thought() {
        let content = "THOUGHT:\nThe flextime agreement is linked.\n\nJSON:\n```json\n[{\"file_name\": \"b.docx\", \"check_reason\": \"x\"}]\n```\nDone.";
        let value = extract_json(content).unwrap();
        assert_eq!(value[0]["file_name"], "b.docx");
    }

    #[test]
    fn test_skips_fence_that_is_not_json() {
        let content = "```text\nnot json\n```\n```json\n{\"is_updated\": false}\n```";
        let value = extract_json(content).unwrap();
        assert_eq!(value, json!({"is_updated": false}));
    }

    #[test]
    fn test_json_embedded_in_prose() {
        let content = r#"Sure, here it is: {"reason": "uses } inside a string", "n": [1, 2]} hope it helps"#;
        let value = extract_json(content).unwrap();
        assert_eq!(value["reason"], "uses } inside a string");
    }

    #[test]
    fn test_skips_unparseable_bracket_prefix() {
        let content = "See [section 3] for details: [\"a.docx\"]";
        let value = extract_json(content).unwrap();
        assert_eq!(value, json!(["a.docx"]));
    }

    #[test]
    fn test_no_json() {
        assert!(extract_json("No additional files need review.").is_none());
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```markdown\n# Title\nbody\n```"), "# Title\nbody");
        assert_eq!(strip_code_fence("# Title"), "# Title");
        assert_eq!(strip_code_fence("  ```\ntext\n```  "), "text");
    }
}
