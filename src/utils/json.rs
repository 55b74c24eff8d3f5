use serde_json::{Map, Value as JsonValue};

/// Payloads written by the out-of-band processor are sometimes encoded twice.
const MAX_UNWRAP_DEPTH: usize = 4;

/// Turns a stored payload into structured JSON.
///
/// Strings are parsed repeatedly until something other than a string comes
/// out. Invalid JSON, scalars and anything still a string after
/// `MAX_UNWRAP_DEPTH` rounds collapse to an empty object.
pub fn unwrap_payload(raw: &JsonValue) -> JsonValue {
    let mut current = raw.clone();
    for _ in 0..MAX_UNWRAP_DEPTH {
        match current {
            JsonValue::String(ref text) => match serde_json::from_str::<JsonValue>(text) {
                Ok(parsed) => current = parsed,
                Err(_) => return empty(),
            },
            JsonValue::Object(_) | JsonValue::Array(_) => return current,
            _ => return empty(),
        }
    }
    match current {
        JsonValue::Object(_) | JsonValue::Array(_) => current,
        _ => empty(),
    }
}

pub fn unwrap_payload_str(text: &str) -> JsonValue {
    unwrap_payload(&JsonValue::String(text.to_string()))
}

fn empty() -> JsonValue {
    JsonValue::Object(Map::new())
}
