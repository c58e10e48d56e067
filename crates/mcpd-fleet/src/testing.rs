//! Scripted [`McpClient`] fakes shared by the fleet test modules.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, GetPromptRequestParam, GetPromptResult,
    ListPromptsResult, ListResourceTemplatesResult, ListResourcesResult, ListToolsResult,
    PaginatedRequestParam, ReadResourceRequestParam, ReadResourceResult, Tool,
};

use crate::client::{ClientError, McpClient};

/// How a [`MockClient`] answers pings.
#[derive(Debug, Clone, Copy)]
pub(crate) enum PingBehavior {
    /// Answer after the given delay.
    Ok(Duration),
    /// Fail immediately with a transport error.
    Unreachable,
    /// Never answer; the future stays pending forever.
    Stuck,
}

/// Configurable fake child. Closing is observable and can be slowed down
/// to exercise the per-client close timeout.
pub(crate) struct MockClient {
    pub(crate) ping: PingBehavior,
    pub(crate) close_delay: Duration,
    pub(crate) tools: Vec<Tool>,
    closed: AtomicBool,
}

impl MockClient {
    pub(crate) fn healthy() -> Arc<Self> {
        Arc::new(Self {
            ping: PingBehavior::Ok(Duration::ZERO),
            close_delay: Duration::ZERO,
            tools: Vec::new(),
            closed: AtomicBool::new(false),
        })
    }

    pub(crate) fn with_ping(ping: PingBehavior) -> Arc<Self> {
        Arc::new(Self {
            ping,
            close_delay: Duration::ZERO,
            tools: Vec::new(),
            closed: AtomicBool::new(false),
        })
    }

    pub(crate) fn with_close_delay(close_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            ping: PingBehavior::Ok(Duration::ZERO),
            close_delay,
            tools: Vec::new(),
            closed: AtomicBool::new(false),
        })
    }

    pub(crate) fn with_tools(tools: Vec<Tool>) -> Arc<Self> {
        Arc::new(Self {
            ping: PingBehavior::Ok(Duration::ZERO),
            close_delay: Duration::ZERO,
            tools,
            closed: AtomicBool::new(false),
        })
    }

    pub(crate) fn was_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Build an rmcp tool description the way a child would advertise it,
/// going through the wire format.
pub(crate) fn tool(name: &str, description: &str) -> Tool {
    serde_json::from_value(serde_json::json!({
        "name": name,
        "description": description,
        "inputSchema": {"type": "object", "properties": {}},
    }))
    .expect("valid tool description")
}

/// Build a tool-call result from its wire form.
pub(crate) fn call_result(text: &str, is_error: bool) -> CallToolResult {
    serde_json::from_value(serde_json::json!({
        "content": [{"type": "text", "text": text}],
        "isError": is_error,
    }))
    .expect("valid call result")
}

#[async_trait]
impl McpClient for MockClient {
    async fn ping(&self) -> Result<(), ClientError> {
        match self.ping {
            PingBehavior::Ok(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            PingBehavior::Unreachable => Err(ClientError::Transport("connection reset".into())),
            PingBehavior::Stuck => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
    ) -> Result<ListToolsResult, ClientError> {
        Ok(ListToolsResult::with_all_items(self.tools.clone()))
    }

    async fn call_tool(
        &self,
        _request: CallToolRequestParam,
    ) -> Result<CallToolResult, ClientError> {
        Ok(call_result("pong", false))
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
    ) -> Result<ListPromptsResult, ClientError> {
        Err(ClientError::MethodNotImplemented)
    }

    async fn get_prompt(
        &self,
        _request: GetPromptRequestParam,
    ) -> Result<GetPromptResult, ClientError> {
        Err(ClientError::MethodNotImplemented)
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
    ) -> Result<ListResourcesResult, ClientError> {
        Err(ClientError::MethodNotImplemented)
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
    ) -> Result<ListResourceTemplatesResult, ClientError> {
        Err(ClientError::MethodNotImplemented)
    }

    async fn read_resource(
        &self,
        _request: ReadResourceRequestParam,
    ) -> Result<ReadResourceResult, ClientError> {
        Err(ClientError::MethodNotImplemented)
    }

    async fn close(&self) -> Result<(), ClientError> {
        tokio::time::sleep(self.close_delay).await;
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
