//! Tool-list detail projection.
//!
//! A post-handler stage over the serialized payload: tool-list responses
//! are projected down to the requested detail level, anything else passes
//! through untouched.

use serde_json::{Map, Value, json};

/// Requested projection of a tool list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailLevel {
    /// `{name, title}` per tool.
    Minimal,
    /// Minimal plus `description`.
    Summary,
    /// Everything the child advertised, schema and annotations included.
    #[default]
    Full,
}

impl DetailLevel {
    /// Parse the `detail` query value. Case and surrounding whitespace are
    /// ignored; unknown or absent values mean `full`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
            Some("minimal") => Self::Minimal,
            Some("summary") => Self::Summary,
            _ => Self::Full,
        }
    }
}

/// Apply the projection to a response payload.
///
/// Only payloads shaped like `{"tools": [...]}` are touched; sibling keys
/// (`nextCursor`) are preserved.
pub fn apply_detail(payload: Value, detail: DetailLevel) -> Value {
    if detail == DetailLevel::Full {
        return payload;
    }
    let Value::Object(mut map) = payload else {
        return payload;
    };
    let Some(Value::Array(tools)) = map.get("tools") else {
        return Value::Object(map);
    };

    let projected: Vec<Value> = tools.iter().map(|tool| project(tool, detail)).collect();
    map.insert("tools".to_string(), Value::Array(projected));
    Value::Object(map)
}

fn project(tool: &Value, detail: DetailLevel) -> Value {
    let mut out = Map::new();
    out.insert("name".to_string(), field(tool, "name"));
    out.insert("title".to_string(), field(tool, "title"));
    if detail == DetailLevel::Summary {
        out.insert("description".to_string(), field(tool, "description"));
    }
    Value::Object(out)
}

/// Missing string fields project as `""` so clients see a stable shape.
fn field(tool: &Value, key: &str) -> Value {
    tool.get(key).cloned().unwrap_or_else(|| json!(""))
}
