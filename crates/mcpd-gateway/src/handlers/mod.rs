//! Route table and per-operation error mapping.

mod health;
mod prompts;
mod resources;
mod servers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use mcpd_core::{DaemonError, normalize_name};
use mcpd_fleet::ClientError;

use crate::state::AppState;

pub(crate) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health/servers", get(health::list))
        .route("/health/servers/{name}", get(health::status))
        .route("/servers", get(servers::list))
        .route("/servers/{name}/tools", get(servers::list_tools))
        .route("/servers/{name}/tools/{tool}", post(servers::call_tool))
        .route("/servers/{name}/prompts", get(prompts::list))
        .route("/servers/{name}/prompts/get", post(prompts::get))
        .route("/servers/{name}/resources", get(resources::list))
        .route("/servers/{name}/resources/templates", get(resources::templates))
        .route("/servers/{name}/resources/content", get(resources::content))
}

/// The child's own error message signals an unknown prompt/resource name;
/// the JSON-RPC layer does not reserve a code for it.
fn sounds_like_not_found(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("not found") || lower.contains("unknown")
}

pub(super) fn prompt_list_error(server: &str, error: ClientError) -> DaemonError {
    match error {
        ClientError::MethodNotImplemented => {
            DaemonError::PromptsNotImplemented(normalize_name(server))
        }
        other => DaemonError::PromptListFailed {
            server: normalize_name(server),
            reason: other.to_string(),
        },
    }
}

pub(super) fn prompt_get_error(server: &str, prompt: &str, error: ClientError) -> DaemonError {
    match error {
        ClientError::MethodNotImplemented => {
            DaemonError::PromptsNotImplemented(normalize_name(server))
        }
        ClientError::Rpc(message) if sounds_like_not_found(&message) => {
            DaemonError::PromptNotFound {
                server: normalize_name(server),
                prompt: prompt.to_string(),
            }
        }
        other => DaemonError::PromptGetFailed {
            server: normalize_name(server),
            prompt: prompt.to_string(),
            reason: other.to_string(),
        },
    }
}

pub(super) fn resource_list_error(server: &str, error: ClientError) -> DaemonError {
    match error {
        ClientError::MethodNotImplemented => {
            DaemonError::ResourcesNotImplemented(normalize_name(server))
        }
        other => DaemonError::ResourceListFailed {
            server: normalize_name(server),
            reason: other.to_string(),
        },
    }
}

pub(super) fn resource_template_error(server: &str, error: ClientError) -> DaemonError {
    match error {
        ClientError::MethodNotImplemented => {
            DaemonError::ResourcesNotImplemented(normalize_name(server))
        }
        other => DaemonError::ResourceTemplateListFailed {
            server: normalize_name(server),
            reason: other.to_string(),
        },
    }
}

pub(super) fn resource_read_error(server: &str, uri: &str, error: ClientError) -> DaemonError {
    match error {
        ClientError::MethodNotImplemented => {
            DaemonError::ResourcesNotImplemented(normalize_name(server))
        }
        ClientError::Rpc(message) if sounds_like_not_found(&message) => {
            DaemonError::ResourceNotFound {
                server: normalize_name(server),
                uri: uri.to_string(),
            }
        }
        other => DaemonError::ResourceReadFailed {
            server: normalize_name(server),
            uri: uri.to_string(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
