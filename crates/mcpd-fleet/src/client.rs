//! The client-handle seam between the daemon and a child MCP server.

use async_trait::async_trait;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, ErrorCode, GetPromptRequestParam, GetPromptResult,
    ListPromptsResult, ListResourceTemplatesResult, ListResourcesResult, ListToolsResult,
    PaginatedRequestParam, ReadResourceRequestParam, ReadResourceResult,
};
use rmcp::service::ServiceError;

/// Failure modes of a single client call, coarse enough for the health
/// scheduler and the gateway to branch on without string inspection.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("request timed out")]
    Timeout,

    #[error("request cancelled")]
    Cancelled,

    #[error("method not implemented by server")]
    MethodNotImplemented,

    #[error("protocol error: {0}")]
    Rpc(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl From<ServiceError> for ClientError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::McpError(data) => {
                // The JSON-RPC code is authoritative; the message match
                // covers transports that flatten errors into strings.
                if data.code == ErrorCode::METHOD_NOT_FOUND
                    || data.message.contains("Method not found")
                {
                    Self::MethodNotImplemented
                } else {
                    Self::Rpc(data.message.to_string())
                }
            }
            ServiceError::Timeout { .. } => Self::Timeout,
            ServiceError::Cancelled { .. } => Self::Cancelled,
            other => Self::Transport(other.to_string()),
        }
    }
}

/// Opaque handle over the stdio connection to one child server.
///
/// The supervisor owns construction ([`crate::StdioClient`] for real
/// children); everything downstream of it — gateway handlers, the health
/// scheduler, teardown — only sees this trait, which keeps those paths
/// testable with scripted fakes.
#[async_trait]
pub trait McpClient: Send + Sync {
    /// Cheap liveness probe. `rmcp` exposes no dedicated ping request, so
    /// implementations issue a minimal `tools/list` round-trip.
    async fn ping(&self) -> Result<(), ClientError>;

    async fn list_tools(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> Result<ListToolsResult, ClientError>;

    async fn call_tool(&self, request: CallToolRequestParam)
    -> Result<CallToolResult, ClientError>;

    async fn list_prompts(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> Result<ListPromptsResult, ClientError>;

    async fn get_prompt(&self, request: GetPromptRequestParam)
    -> Result<GetPromptResult, ClientError>;

    async fn list_resources(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> Result<ListResourcesResult, ClientError>;

    async fn list_resource_templates(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> Result<ListResourceTemplatesResult, ClientError>;

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
    ) -> Result<ReadResourceResult, ClientError>;

    /// Best-effort shutdown: cancel the protocol task, reap the child.
    /// Idempotent; later calls are no-ops.
    async fn close(&self) -> Result<(), ClientError>;
}

#[cfg(test)]
mod tests {
    use super::ClientError;
    use rmcp::ErrorData;
    use rmcp::model::ErrorCode;
    use rmcp::service::ServiceError;

    #[test]
    fn method_not_found_code_maps_to_not_implemented() {
        let error = ServiceError::McpError(ErrorData::new(
            ErrorCode::METHOD_NOT_FOUND,
            "prompts/list unsupported",
            None,
        ));
        assert!(matches!(
            ClientError::from(error),
            ClientError::MethodNotImplemented
        ));
    }

    #[test]
    fn method_not_found_message_maps_to_not_implemented() {
        let error = ServiceError::McpError(ErrorData::new(
            ErrorCode::INTERNAL_ERROR,
            "Method not found",
            None,
        ));
        assert!(matches!(
            ClientError::from(error),
            ClientError::MethodNotImplemented
        ));
    }

    #[test]
    fn other_rpc_errors_keep_their_message() {
        let error = ServiceError::McpError(ErrorData::new(
            ErrorCode::INVALID_PARAMS,
            "bad arguments",
            None,
        ));
        match ClientError::from(error) {
            ClientError::Rpc(message) => assert!(message.contains("bad arguments")),
            other => panic!("expected Rpc, got {other:?}"),
        }
    }
}
