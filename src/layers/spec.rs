use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Fill,
    Line,
}

/// A declarative paint layer in the Mapbox GL style shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub source: String,
    #[serde(default)]
    pub paint: Map<String, Value>,
}

impl LayerSpec {
    pub fn new(id: &str, kind: LayerKind, source: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            source: source.to_string(),
            paint: Map::new(),
        }
    }

    pub fn fill(id: &str, source: &str) -> Self {
        Self::new(id, LayerKind::Fill, source)
    }

    pub fn line(id: &str, source: &str) -> Self {
        Self::new(id, LayerKind::Line, source)
    }

    pub fn with_paint(mut self, property: &str, value: Value) -> Self {
        self.paint.insert(property.to_string(), value);
        self
    }

    /// Whether any paint property reads the given feature-state key
    pub fn reads_feature_state(&self, key: &str) -> bool {
        self.paint.values().any(|v| mentions_feature_state(v, key))
    }
}

/// `["case", ["boolean", ["feature-state", key], false], when_set, otherwise]`
///
/// The `boolean` coercion makes an absent flag read as false, so features that
/// were never hovered use `otherwise`.
pub fn feature_state_case(key: &str, when_set: Value, otherwise: Value) -> Value {
    json!([
        "case",
        ["boolean", ["feature-state", key], false],
        when_set,
        otherwise
    ])
}

fn mentions_feature_state(expr: &Value, key: &str) -> bool {
    match expr {
        Value::Array(items) => {
            let direct = matches!(
                items.as_slice(),
                [Value::String(op), Value::String(k)] if op == "feature-state" && k == key
            );
            direct || items.iter().any(|item| mentions_feature_state(item, key))
        }
        _ => false,
    }
}
