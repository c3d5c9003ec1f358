use serde_json::{Map, Value};

/// Generic decoded view of a service response.
pub type ResponseMap = Map<String, Value>;

/// Decodes `body` into a key/value map. Empty, malformed and non-object
/// bodies all come back as an empty map.
pub fn parse(body: &[u8]) -> ResponseMap {
    if body.is_empty() {
        return ResponseMap::new();
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::debug!(kind = json_kind(&other), "response body is not a JSON object");
            ResponseMap::new()
        }
        Err(e) => {
            tracing::debug!(error = %e, "response body is not valid JSON");
            ResponseMap::new()
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
