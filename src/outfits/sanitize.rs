//! Coerces whatever the model returned into the fixed `Outfit` shape.

use serde_json::Value;
use thiserror::Error;

use super::Outfit;

#[derive(Debug, Error)]
#[error("Model returned unparseable JSON: {0}")]
pub struct ContentParseError(pub String);

/// String conversion with JavaScript `String(x)` semantics.
fn js_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        Value::Array(values) => values
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => js_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn field_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(other) => js_string(other),
    }
}

fn field_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().map(js_string).collect(),
        _ => Vec::new(),
    }
}

fn sanitize_outfit(value: &Value) -> Outfit {
    Outfit {
        name: field_string(value.get("name")),
        vibe: field_string(value.get("vibe")),
        items: field_list(value.get("items")),
        colors: field_list(value.get("colors")),
        accessories: field_list(value.get("accessories")),
        occasion: field_string(value.get("occasion")),
        price_range: field_string(value.get("price_range")),
        caption: field_string(value.get("caption")),
        prompt: field_string(value.get("prompt")),
    }
}

/// Keeps every object-like entry of `outfits`; scalars are dropped, missing
/// fields become empty strings or lists.
pub fn sanitize(data: &Value) -> Vec<Outfit> {
    let Some(entries) = data.get("outfits").and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter(|entry| entry.is_object() || entry.is_array())
        .map(sanitize_outfit)
        .collect()
}

/// Parses chat output as JSON. Prose or code fences around the object are
/// tolerated by cutting from the first `{` to the last `}`.
pub fn parse_model_content(text: &str) -> Result<Value, ContentParseError> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Ok(value);
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => serde_json::from_str(&text[start..=end])
            .map_err(|err| ContentParseError(err.to_string())),
        _ => Ok(serde_json::json!({ "outfits": [] })),
    }
}
