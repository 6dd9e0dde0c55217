//! JSON recovery parser for malformed model output.
//!
//! Models wrap JSON in markdown fences, lead with prose, use single quotes,
//! leave trailing commas, or interleave comments. This module salvages a
//! valid `serde_json::Value` from such text without ever raising: every entry
//! point returns `Option`.
//!
//! Attempt order:
//! 1. fenced code blocks (```json first, then bare ```), first block that
//!    parses wins;
//! 2. the first balanced `{...}` span and the first balanced `[...]` span
//!    (bracket-depth counting, string-aware), longest valid span wins;
//! 3. the whole trimmed text.
//!
//! Every candidate is normalized first: BOM stripped, single-quoted
//! keys/values converted, trailing commas removed, `//` and `/* */` comments
//! stripped.

use std::sync::LazyLock;

use regex::Regex;

static FENCE_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```json\s*\n(.*?)\n\s*```").expect("fence regex")
});
static FENCE_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```\s*\n(.*?)\n\s*```").expect("fence regex"));

/// Salvage a JSON value from free-form model output.
pub fn recover_json(text: &str) -> Option<serde_json::Value> {
    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return None;
    }

    // 1. Fenced code blocks.
    for fence in [&*FENCE_JSON, &*FENCE_BARE] {
        for capture in fence.captures_iter(text) {
            if let Some(value) = parse_normalized(capture[1].trim()) {
                return Some(value);
            }
        }
    }

    // 2. Balanced object/array spans; prefer the longest that parses.
    let object_span = balanced_span(text, '{', '}').and_then(|s| parse_normalized(s).map(|v| (s, v)));
    let array_span = balanced_span(text, '[', ']').and_then(|s| parse_normalized(s).map(|v| (s, v)));

    match (object_span, array_span) {
        (Some((os, ov)), Some((as_, av))) => {
            return Some(if os.len() >= as_.len() { ov } else { av });
        }
        (Some((_, v)), None) | (None, Some((_, v))) => return Some(v),
        (None, None) => {}
    }

    // 3. The whole trimmed text.
    parse_normalized(text.trim())
}

/// Coerce a recovered value to an array.
///
/// Objects unwrap a known list field (`contacts`) when present; anything else
/// coerces to an empty array.
pub fn coerce_to_array(value: serde_json::Value) -> Vec<serde_json::Value> {
    match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => match map.remove("contacts") {
            Some(serde_json::Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Coerce a recovered value to an object.
///
/// Arrays wrap as `{"contacts": [...]}`; anything else coerces to an empty
/// object.
pub fn coerce_to_object(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Array(items) => {
            let mut map = serde_json::Map::new();
            map.insert("contacts".into(), serde_json::Value::Array(items));
            map
        }
        _ => serde_json::Map::new(),
    }
}

/// Normalize then parse one candidate span.
fn parse_normalized(candidate: &str) -> Option<serde_json::Value> {
    if candidate.is_empty() {
        return None;
    }
    // Fast path: already valid.
    if let Ok(value) = serde_json::from_str(candidate) {
        return Some(value);
    }
    let normalized = normalize(candidate);
    serde_json::from_str(&normalized).ok()
}

/// Find the first balanced `open...close` span, skipping brackets inside
/// double-quoted string literals.
fn balanced_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
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
            c if c == open => depth += 1,
            c if c == close => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Apply the lenient-JSON normalizations: BOM, comments, single quotes,
/// trailing commas.
fn normalize(text: &str) -> String {
    let text = text.trim_start_matches('\u{feff}');
    let without_comments = strip_comments(text);
    let double_quoted = convert_single_quotes(&without_comments);
    strip_trailing_commas(&double_quoted)
}

/// Remove `//` line comments and `/* */` block comments outside strings.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    let mut in_string = false;
    let mut escaped = false;

    while i < chars.len() {
        let ch = chars[i];
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i + 1 < chars.len() && !(chars[i] == '*' && chars[i + 1] == '/') {
                    i += 1;
                }
                i = (i + 2).min(chars.len());
            }
            _ => {
                out.push(ch);
                i += 1;
            }
        }
    }
    out
}

/// Convert single-quoted strings to double-quoted, escaping any inner `"`.
fn convert_single_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    let mut in_double = false;
    let mut escaped = false;

    while i < chars.len() {
        let ch = chars[i];
        if in_double {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_double = false;
            }
            i += 1;
            continue;
        }
        match ch {
            '"' => {
                in_double = true;
                out.push(ch);
                i += 1;
            }
            '\'' => {
                // Scan to the closing single quote, honoring backslash escapes.
                out.push('"');
                i += 1;
                while i < chars.len() {
                    let inner = chars[i];
                    if inner == '\\' && chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                    } else if inner == '\'' {
                        out.push('"');
                        i += 1;
                        break;
                    } else {
                        if inner == '"' {
                            out.push('\\');
                        }
                        out.push(inner);
                        i += 1;
                    }
                }
            }
            _ => {
                out.push(ch);
                i += 1;
            }
        }
    }
    out
}

/// Remove commas that directly precede a closing `}` or `]` (outside strings).
fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &ch) in chars.iter().enumerate() {
        if in_string {
            out.push(ch);
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
            '"' => {
                in_string = true;
                out.push(ch);
            }
            ',' => {
                // Drop the comma if the next non-whitespace char closes a scope.
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(ch);
                }
            }
            _ => out.push(ch),
        }
    }
    out
}
