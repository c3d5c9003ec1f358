use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Request payload built from user input. Only keys that were explicitly set
/// end up in the encoded JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RequestParameters(BTreeMap<String, Value>);

impl RequestParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Sets `key` only when `value` is present.
    pub fn set_opt<V: Into<Value>>(&mut self, key: &str, value: Option<V>) -> &mut Self {
        if let Some(v) = value {
            self.set(key, v);
        }
        self
    }

    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

impl TryFrom<Value> for RequestParameters {
    type Error = String;

    fn try_from(v: Value) -> Result<Self, Self::Error> {
        match v {
            Value::Object(m) => Ok(Self(m.into_iter().collect())),
            other => Err(format!(
                "request parameters must be a JSON object, got {}",
                other
            )),
        }
    }
}
