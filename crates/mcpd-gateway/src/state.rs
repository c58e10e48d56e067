//! Shared handler state.

use std::sync::Arc;
use std::time::Duration;

use mcpd_core::DaemonError;
use mcpd_fleet::{ClientError, ClientRegistry, HealthTracker, McpClient};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);

/// Everything a handler needs: the two fleet maps and the per-request
/// ceiling on downstream MCP calls.
pub struct AppState {
    pub registry: Arc<ClientRegistry>,
    pub tracker: Arc<HealthTracker>,
    pub call_timeout: Duration,
}

impl AppState {
    pub fn new(registry: Arc<ClientRegistry>, tracker: Arc<HealthTracker>) -> Self {
        Self {
            registry,
            tracker,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Registry lookup that turns a miss into the 404 sentinel.
    pub(crate) fn client(&self, name: &str) -> Result<Arc<dyn McpClient>, DaemonError> {
        self.registry
            .client(name)
            .ok_or_else(|| DaemonError::ServerNotFound(name.trim().to_string()))
    }

    /// Allow-list lookup with its own 404 sentinel.
    pub(crate) fn allowed_tools(&self, name: &str) -> Result<Vec<String>, DaemonError> {
        self.registry
            .tools(name)
            .ok_or_else(|| DaemonError::ToolsNotFound(name.trim().to_string()))
    }

    /// Run a downstream MCP call under the request timeout. The elapsed
    /// timer surfaces as a [`ClientError::Timeout`] so per-operation error
    /// mapping stays in one place.
    pub(crate) async fn call<T>(
        &self,
        call: impl Future<Output = Result<T, ClientError>>,
    ) -> Result<T, ClientError> {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout),
        }
    }
}
