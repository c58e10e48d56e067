//! `/health/servers` handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use mcpd_core::HealthRecord;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::state::AppState;

/// All tracked records, sorted by server name.
pub(super) async fn list(State(state): State<Arc<AppState>>) -> Json<Value> {
    let mut records = state.tracker.list();
    records.sort_by(|a, b| a.name.cmp(&b.name));
    Json(json!({ "servers": records }))
}

/// One record; 404 when the server is not tracked.
pub(super) async fn status(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<HealthRecord>, ApiError> {
    let record = state.tracker.status(&name)?;
    Ok(Json(record))
}
