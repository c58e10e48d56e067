//! The real client handle: a child process speaking MCP over stdio.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, GetPromptRequestParam, GetPromptResult,
    ListPromptsResult, ListResourceTemplatesResult, ListResourcesResult, ListToolsResult,
    PaginatedRequestParam, ReadResourceRequestParam, ReadResourceResult,
};
use rmcp::service::{Peer, RoleClient, RunningService, ServiceExt};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::client::{ClientError, McpClient};
use crate::stderr::spawn_stderr_reader;

const CHILD_REAP_GRACE: Duration = Duration::from_secs(3);

/// Child process plus the rmcp service driving its stdio JSON-RPC stream.
///
/// The peer clone is the call surface; the running service and the child
/// handle are parked behind mutexes so `close` can consume them from a
/// shared reference. After `close`, peer calls fail with transport errors.
#[derive(Debug)]
pub struct StdioClient {
    server_name: String,
    peer: Peer<RoleClient>,
    service: Mutex<Option<RunningService<RoleClient, ()>>>,
    child: Mutex<Option<tokio::process::Child>>,
    stderr_cancel: CancellationToken,
}

impl StdioClient {
    /// Spawn the command, wire its stderr into the daemon log, and perform
    /// the MCP initialize handshake under `init_timeout`.
    pub async fn connect(
        server_name: &str,
        mut cmd: Command,
        init_timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        cmd.stdout(std::process::Stdio::piped());
        cmd.stdin(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn MCP server '{server_name}'"))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("failed to capture stdout for MCP server '{server_name}'"))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("failed to capture stdin for MCP server '{server_name}'"))?;

        let stderr_cancel = cancel.child_token();
        if let Some(stderr) = child.stderr.take() {
            spawn_stderr_reader(server_name.to_string(), stderr, stderr_cancel.clone());
        }

        let service = tokio::time::timeout(init_timeout, ().serve((stdout, stdin)))
            .await
            .map_err(|_| {
                anyhow!(
                    "MCP server '{server_name}' did not complete initialization within {init_timeout:?}"
                )
            })?
            .with_context(|| format!("MCP handshake failed for server '{server_name}'"))?;

        let peer = service.peer().clone();

        Ok(Self {
            server_name: server_name.to_string(),
            peer,
            service: Mutex::new(Some(service)),
            child: Mutex::new(Some(child)),
            stderr_cancel,
        })
    }
}

#[async_trait]
impl McpClient for StdioClient {
    async fn ping(&self) -> Result<(), ClientError> {
        self.peer.list_tools(None).await?;
        Ok(())
    }

    async fn list_tools(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> Result<ListToolsResult, ClientError> {
        Ok(self.peer.list_tools(request).await?)
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, ClientError> {
        Ok(self.peer.call_tool(request).await?)
    }

    async fn list_prompts(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> Result<ListPromptsResult, ClientError> {
        Ok(self.peer.list_prompts(request).await?)
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
    ) -> Result<GetPromptResult, ClientError> {
        Ok(self.peer.get_prompt(request).await?)
    }

    async fn list_resources(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> Result<ListResourcesResult, ClientError> {
        Ok(self.peer.list_resources(request).await?)
    }

    async fn list_resource_templates(
        &self,
        request: Option<PaginatedRequestParam>,
    ) -> Result<ListResourceTemplatesResult, ClientError> {
        Ok(self.peer.list_resource_templates(request).await?)
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
    ) -> Result<ReadResourceResult, ClientError> {
        Ok(self.peer.read_resource(request).await?)
    }

    async fn close(&self) -> Result<(), ClientError> {
        if let Some(service) = self.service.lock().await.take() {
            let _ = service.cancel().await;
        }

        self.stderr_cancel.cancel();

        if let Some(mut child) = self.child.lock().await.take() {
            match tokio::time::timeout(CHILD_REAP_GRACE, child.wait()).await {
                Ok(Ok(_)) => {}
                Ok(Err(error)) => {
                    tracing::debug!(
                        server = %self.server_name,
                        error = %error,
                        "failed to wait for MCP child process"
                    );
                }
                Err(_) => {
                    let _ = child.kill().await;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "stdio_tests.rs"]
mod tests;
