//! Versioned HTTP/JSON gateway over the fleet.
//!
//! Routes live under `/api/v1`. Handlers look servers up in the client
//! registry at request time, forward MCP calls with a bounded timeout, and
//! map every [`mcpd_core::DaemonError`] to an HTTP status plus an
//! `Mcpd-Error-Type` header.

pub mod cors;
pub mod error;
mod handlers;
pub mod server;
pub mod state;
pub mod transform;
mod wire;

pub use cors::CorsConfig;
pub use error::ApiError;
pub use server::{GatewayOptions, serve};
pub use state::AppState;
pub use transform::DetailLevel;

/// Versioned path prefix for every route.
pub const API_PREFIX: &str = "/api/v1";

/// Build the full gateway router.
pub fn router(state: std::sync::Arc<AppState>, cors: &CorsConfig) -> axum::Router {
    let api = handlers::routes().with_state(state);
    let mut app = axum::Router::new().nest(API_PREFIX, api);
    if let Some(layer) = cors::cors_layer(cors) {
        app = app.layer(layer);
    }
    app
}
