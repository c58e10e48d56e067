use std::fs;
use std::time::Duration;

use anyhow::Result;
use rmcp::model::CallToolRequestParam;
use serde_json::json;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::StdioClient;
use crate::client::{ClientError, McpClient};

fn write_script(dir: &std::path::Path, body: &str) -> Result<std::path::PathBuf> {
    let path = dir.join("mock-mcp.sh");
    fs::write(&path, body)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms)?;
    }
    Ok(path)
}

const MOCK_SERVER: &str = r#"#!/bin/sh
while IFS= read -r line; do
  id=$(printf '%s\n' "$line" | sed -n 's/.*"id"[ ]*:[ ]*\([^,}]*\).*/\1/p')
  case "$line" in
    *\"initialize\"*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"protocolVersion":"2024-11-05","capabilities":{"tools":{}},"serverInfo":{"name":"mock","version":"0.1.0"}}}\n' "$id"
      ;;
    *\"notifications/initialized\"*)
      ;;
    *\"tools/list\"*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"tools":[{"name":"echo_tool","description":"echo","inputSchema":{"type":"object","properties":{}}}]}}\n' "$id"
      ;;
    *\"tools/call\"*)
      printf '{"jsonrpc":"2.0","id":%s,"result":{"content":[{"type":"text","text":"pong"}]}}\n' "$id"
      ;;
    *\"prompts/list\"*)
      printf '{"jsonrpc":"2.0","id":%s,"error":{"code":-32601,"message":"Method not found"}}\n' "$id"
      ;;
    *)
      printf '{"jsonrpc":"2.0","id":%s,"result":{}}\n' "$id"
      ;;
  esac
done
"#;

async fn connect(script: &std::path::Path) -> Result<StdioClient> {
    let mut cmd = Command::new("sh");
    cmd.arg(script);
    StdioClient::connect(
        "mock",
        cmd,
        Duration::from_secs(5),
        &CancellationToken::new(),
    )
    .await
}

#[tokio::test]
async fn handshake_list_and_call_round_trip() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let script = write_script(temp.path(), MOCK_SERVER)?;
    let client = connect(&script).await?;

    let tools = client.list_tools(None).await?;
    assert_eq!(tools.tools[0].name.as_ref(), "echo_tool");

    let response = client
        .call_tool(
            CallToolRequestParam::new("echo_tool")
                .with_arguments(json!({"value": "ping"}).as_object().cloned().unwrap_or_default()),
        )
        .await?;
    assert_eq!(
        response.content[0].as_text().map(|t| t.text.as_str()),
        Some("pong")
    );

    client.ping().await?;
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn missing_method_maps_to_not_implemented() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let script = write_script(temp.path(), MOCK_SERVER)?;
    let client = connect(&script).await?;

    let error = client.list_prompts(None).await.unwrap_err();
    assert!(matches!(error, ClientError::MethodNotImplemented));

    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn handshake_timeout_names_the_server() -> Result<()> {
    let temp = tempfile::tempdir()?;
    // Reads requests but never answers, so initialize can only time out.
    let script = write_script(
        temp.path(),
        "#!/bin/sh\nwhile IFS= read -r line; do :; done\n",
    )?;

    let mut cmd = Command::new("sh");
    cmd.arg(&script);
    let error = StdioClient::connect(
        "silent",
        cmd,
        Duration::from_millis(300),
        &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(error.to_string().contains("silent"));
    Ok(())
}

#[tokio::test]
async fn close_is_idempotent() -> Result<()> {
    let temp = tempfile::tempdir()?;
    let script = write_script(temp.path(), MOCK_SERVER)?;
    let client = connect(&script).await?;

    client.close().await?;
    client.close().await?;
    Ok(())
}
