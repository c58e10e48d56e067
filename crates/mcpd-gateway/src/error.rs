//! Domain error → HTTP response mapping.

use axum::Json;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use mcpd_core::DaemonError;
use serde_json::json;

/// Response header naming the coarse error category.
pub const ERROR_TYPE_HEADER: &str = "mcpd-error-type";

/// Wrapper giving every [`DaemonError`] an HTTP rendering: mapped status,
/// category header, JSON body with the human-readable message.
#[derive(Debug)]
pub struct ApiError(pub DaemonError);

impl From<DaemonError> for ApiError {
    fn from(error: DaemonError) -> Self {
        Self(error)
    }
}

/// The sentinel → status table.
pub fn status_for(error: &DaemonError) -> StatusCode {
    use DaemonError::*;
    match error {
        BadRequest(_) => StatusCode::BAD_REQUEST,
        ToolForbidden { .. } | PromptForbidden { .. } | ResourceForbidden { .. } => {
            StatusCode::FORBIDDEN
        }
        ServerNotFound(_)
        | ToolsNotFound(_)
        | HealthNotTracked(_)
        | PromptNotFound { .. }
        | ResourceNotFound { .. } => StatusCode::NOT_FOUND,
        PromptsNotImplemented(_) | ResourcesNotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        ToolListFailed { .. }
        | ToolCallFailed { .. }
        | ToolCallFailedUnknown { .. }
        | PromptListFailed { .. }
        | PromptGetFailed { .. }
        | ResourceListFailed { .. }
        | ResourceTemplateListFailed { .. }
        | ResourceReadFailed { .. } => StatusCode::BAD_GATEWAY,
        Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::warn!(kind = self.0.kind(), error = %self.0, "request failed");
        }
        let mut response = (status, Json(json!({ "error": self.0.to_string() }))).into_response();
        response.headers_mut().insert(
            HeaderName::from_static(ERROR_TYPE_HEADER),
            HeaderValue::from_static(self.0.kind()),
        );
        response
    }
}
