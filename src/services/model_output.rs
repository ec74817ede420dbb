//! Helpers for decoding free-text model output.
//!
//! Models wrap JSON in prose or code fences and are loose about scalar
//! types. These helpers find the JSON payload and accept the common
//! variants (numbers as strings, "yes" for true) so typed decoding can stay
//! strict about structure.

use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// Find the first balanced JSON span opening with `open` (`{` or `[`).
///
/// Brackets inside string literals are ignored. Returns `None` when the
/// opener never appears or is never closed.
pub fn find_json_span(text: &str, open: char) -> Option<&str> {
    let close = match open {
        '{' => '}',
        '[' => ']',
        _ => return None,
    };

    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse a monetary or numeric value: `120`, `120.5`, `"$1,204.50"`, `"95%"`.
pub fn parse_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Deserialize an optional number that may arrive as a string.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_number))
}

/// Deserialize an optional string that may arrive as a number or bool.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(JsonValue::String(s)) => Some(s).filter(|s| !s.trim().is_empty()),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        Some(JsonValue::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Deserialize an optional flag that may arrive as `"yes"`/`"no"`.
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(JsonValue::Bool(b)) => Some(b),
        Some(JsonValue::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "y" | "present" => Some(true),
            "false" | "no" | "n" | "absent" => Some(false),
            _ => None,
        },
        Some(JsonValue::Number(n)) => n.as_f64().map(|v| v != 0.0),
        _ => None,
    })
}
