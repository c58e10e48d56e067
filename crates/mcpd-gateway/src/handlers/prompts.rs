//! `/servers/{name}/prompts` handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use rmcp::model::{GetPromptRequestParam, PaginatedRequestParam};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use super::{prompt_get_error, prompt_list_error};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub(super) struct CursorQuery {
    cursor: Option<String>,
}

/// Paginated prompt listing, passed through in the child's wire shape.
pub(super) async fn list(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<CursorQuery>,
) -> Result<Json<Value>, ApiError> {
    let client = state.client(&name)?;
    let request = query
        .cursor
        .map(|cursor| PaginatedRequestParam::default().with_cursor(Some(cursor)));

    let result = state
        .call(client.list_prompts(request))
        .await
        .map_err(|error| prompt_list_error(&name, error))?;

    Ok(Json(
        serde_json::to_value(&result).unwrap_or_else(|_| json!({ "prompts": [] })),
    ))
}

#[derive(Deserialize)]
pub(super) struct GetPromptBody {
    name: String,
    #[serde(default)]
    arguments: Option<Map<String, Value>>,
}

/// Fetch one prompt. Message content is forwarded opaquely, so content
/// kinds this daemon does not materialize still reach the caller intact.
pub(super) async fn get(
    State(state): State<Arc<AppState>>,
    Path(server): Path<String>,
    Json(body): Json<GetPromptBody>,
) -> Result<Json<Value>, ApiError> {
    let client = state.client(&server)?;
    let mut request = GetPromptRequestParam::new(body.name.clone());
    if let Some(arguments) = body.arguments {
        request = request.with_arguments(arguments);
    }

    let result = state
        .call(client.get_prompt(request))
        .await
        .map_err(|error| prompt_get_error(&server, &body.name, error))?;

    Ok(Json(serde_json::to_value(&result).unwrap_or_else(|_| json!({}))))
}
