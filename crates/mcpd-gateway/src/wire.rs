//! Conversions between rmcp model types and the gateway's JSON surface.

use mcpd_core::normalize_name;
use rmcp::model::{CallToolResult, ReadResourceResult, ResourceContents, Tool};
use serde_json::{Value, json};

/// Serialize one advertised tool to its wire form.
pub(crate) fn tool_to_value(tool: &Tool) -> Value {
    serde_json::to_value(tool).unwrap_or_else(|_| json!({}))
}

/// Keep only tools whose normalized name is on the allow-list.
pub(crate) fn filter_allowed<'a>(
    tools: &'a [Tool],
    allowed: &'a [String],
) -> impl Iterator<Item = &'a Tool> {
    tools
        .iter()
        .filter(|tool| allowed.iter().any(|name| *name == normalize_name(&tool.name)))
}

/// The text of the first text content item; empty when there is none.
pub(crate) fn extract_text(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .find_map(|content| content.as_text())
        .map(|text| text.text.clone())
        .unwrap_or_default()
}

/// Materialize resource contents: text and blob items survive, anything
/// else is dropped silently.
pub(crate) fn resource_contents_to_values(result: &ReadResourceResult) -> Vec<Value> {
    result
        .contents
        .iter()
        .map(|contents| match contents {
            ResourceContents::TextResourceContents {
                uri,
                mime_type,
                text,
                ..
            } => json!({
                "uri": uri,
                "mimeType": mime_type,
                "text": text,
            }),
            ResourceContents::BlobResourceContents {
                uri,
                mime_type,
                blob,
                ..
            } => json!({
                "uri": uri,
                "mimeType": mime_type,
                "blob": blob,
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{extract_text, filter_allowed, tool_to_value};
    use rmcp::model::{CallToolResult, Tool};
    use serde_json::json;

    fn tool(name: &str) -> Tool {
        serde_json::from_value(json!({
            "name": name,
            "description": "desc",
            "inputSchema": {"type": "object"},
        }))
        .expect("valid tool")
    }

    fn call_result(content: serde_json::Value) -> CallToolResult {
        serde_json::from_value(json!({ "content": content })).expect("valid call result")
    }

    #[test]
    fn allow_list_filtering_is_case_insensitive() {
        let tools = vec![tool("GetTime"), tool("Wipe"), tool("Echo")];
        let allowed = vec!["gettime".to_string(), "echo".to_string()];
        let kept: Vec<&str> = filter_allowed(&tools, &allowed)
            .map(|t| t.name.as_ref())
            .collect();
        assert_eq!(kept, vec!["GetTime", "Echo"]);
    }

    #[test]
    fn tool_serializes_with_camel_case_schema_key() {
        let value = tool_to_value(&tool("t"));
        assert_eq!(value["name"], "t");
        assert!(value.get("inputSchema").is_some());
    }

    #[test]
    fn extract_text_takes_the_first_text_item() {
        let result = call_result(json!([
            {"type": "text", "text": "first"},
            {"type": "text", "text": "second"},
        ]));
        assert_eq!(extract_text(&result), "first");
    }

    #[test]
    fn extract_text_skips_non_text_items() {
        let result = call_result(json!([
            {"type": "image", "data": "aGk=", "mimeType": "image/png"},
            {"type": "text", "text": "caption"},
        ]));
        assert_eq!(extract_text(&result), "caption");
    }

    #[test]
    fn extract_text_defaults_to_empty() {
        let result = call_result(json!([]));
        assert_eq!(extract_text(&result), "");
    }
}
