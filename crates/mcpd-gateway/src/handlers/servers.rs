//! `/servers` handlers: name listing, tool listing, tool calls.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use mcpd_core::{DaemonError, normalize_name};
use mcpd_fleet::ClientError;
use rmcp::model::CallToolRequestParam;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::state::AppState;
use crate::transform::{DetailLevel, apply_detail};
use crate::wire::{extract_text, filter_allowed, tool_to_value};

/// Sorted registry names.
pub(super) async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    let mut names = state.registry.list();
    names.sort();
    Json(names)
}

#[derive(Deserialize)]
pub(super) struct DetailQuery {
    detail: Option<String>,
}

/// Tools advertised by the child, intersected with the allow-list and
/// projected per the `detail` query parameter.
pub(super) async fn list_tools(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<DetailQuery>,
) -> Result<Json<Value>, ApiError> {
    let client = state.client(&name)?;
    let allowed = state.allowed_tools(&name)?;

    let result = state
        .call(client.list_tools(None))
        .await
        .map_err(|error| DaemonError::ToolListFailed {
            server: normalize_name(&name),
            reason: error.to_string(),
        })?;

    let tools: Vec<Value> = filter_allowed(&result.tools, &allowed)
        .map(tool_to_value)
        .collect();
    let detail = DetailLevel::parse(query.detail.as_deref());
    Ok(Json(apply_detail(json!({ "tools": tools }), detail)))
}

/// Forward one tool call. The tool must be on the allow-list; the response
/// is the text of the first text content item the child returned.
pub(super) async fn call_tool(
    State(state): State<Arc<AppState>>,
    Path((server, tool)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let Some(arguments) = body.as_object().cloned() else {
        return Err(DaemonError::BadRequest(
            "request body must be a JSON object of tool arguments".to_string(),
        )
        .into());
    };

    let client = state.client(&server)?;
    let allowed = state.allowed_tools(&server)?;
    let wanted = normalize_name(&tool);
    if !allowed.contains(&wanted) {
        return Err(DaemonError::ToolForbidden {
            server: normalize_name(&server),
            tool: wanted,
        }
        .into());
    }

    let request = CallToolRequestParam::new(tool.trim().to_string()).with_arguments(arguments);
    let result = state
        .call(client.call_tool(request))
        .await
        .map_err(|error| call_error(&server, &wanted, error))?;

    let text = extract_text(&result);
    if result.is_error == Some(true) {
        let error = if text.is_empty() {
            DaemonError::ToolCallFailedUnknown {
                server: normalize_name(&server),
                tool: wanted,
            }
        } else {
            DaemonError::ToolCallFailed {
                server: normalize_name(&server),
                tool: wanted,
                reason: text,
            }
        };
        return Err(error.into());
    }

    Ok(Json(Value::String(text)))
}

fn call_error(server: &str, tool: &str, error: ClientError) -> DaemonError {
    DaemonError::ToolCallFailed {
        server: normalize_name(server),
        tool: tool.to_string(),
        reason: error.to_string(),
    }
}
