//! `/servers/{name}/resources` handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use mcpd_core::DaemonError;
use rmcp::model::{PaginatedRequestParam, ReadResourceRequestParam};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{resource_list_error, resource_read_error, resource_template_error};
use crate::error::ApiError;
use crate::state::AppState;
use crate::wire::resource_contents_to_values;

#[derive(Deserialize)]
pub(super) struct CursorQuery {
    cursor: Option<String>,
}

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
        .call(client.list_resources(request))
        .await
        .map_err(|error| resource_list_error(&name, error))?;

    Ok(Json(
        serde_json::to_value(&result).unwrap_or_else(|_| json!({ "resources": [] })),
    ))
}

pub(super) async fn templates(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<CursorQuery>,
) -> Result<Json<Value>, ApiError> {
    let client = state.client(&name)?;
    let request = query
        .cursor
        .map(|cursor| PaginatedRequestParam::default().with_cursor(Some(cursor)));

    let result = state
        .call(client.list_resource_templates(request))
        .await
        .map_err(|error| resource_template_error(&name, error))?;

    Ok(Json(
        serde_json::to_value(&result).unwrap_or_else(|_| json!({ "resourceTemplates": [] })),
    ))
}

#[derive(Deserialize)]
pub(super) struct ContentQuery {
    uri: Option<String>,
}

/// Read one resource. Text and blob items are materialized; other content
/// kinds are dropped silently.
pub(super) async fn content(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<Value>, ApiError> {
    let Some(uri) = query.uri.filter(|uri| !uri.trim().is_empty()) else {
        return Err(
            DaemonError::BadRequest("missing required query parameter 'uri'".to_string()).into(),
        );
    };

    let client = state.client(&name)?;
    let result = state
        .call(client.read_resource(ReadResourceRequestParam::new(uri.clone())))
        .await
        .map_err(|error| resource_read_error(&name, &uri, error))?;

    Ok(Json(json!({ "contents": resource_contents_to_values(&result) })))
}
