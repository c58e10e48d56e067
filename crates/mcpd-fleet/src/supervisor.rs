//! Process-fleet supervisor: launches, tracks, and stops child servers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use mcpd_config::{Runtime, RuntimeServer};
use mcpd_core::{DaemonError, normalize_name};
use mcpd_isolation::EnvFilter;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::client::McpClient;
use crate::health::HealthTracker;
use crate::registry::ClientRegistry;
use crate::reload::plan_reload;
use crate::stdio::StdioClient;

const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
pub struct SupervisorOptions {
    /// Ceiling on spawn + MCP initialize per server.
    pub init_timeout: Duration,
    /// Ceiling on one client's close, both at shutdown and on reload.
    pub close_timeout: Duration,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            init_timeout: DEFAULT_INIT_TIMEOUT,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }
}

/// Seam between the supervisor and real child processes. Production uses
/// [`StdioLauncher`]; tests substitute scripted clients.
#[async_trait]
pub trait ClientLauncher: Send + Sync {
    async fn launch(
        &self,
        server: &RuntimeServer,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn McpClient>>;
}

/// Launches runner subprocesses (`npx`, `uvx`, `python`, `docker`) with a
/// filtered environment and performs the stdio handshake.
pub struct StdioLauncher {
    init_timeout: Duration,
}

impl StdioLauncher {
    pub fn new(init_timeout: Duration) -> Self {
        Self { init_timeout }
    }
}

#[async_trait]
impl ClientLauncher for StdioLauncher {
    async fn launch(
        &self,
        server: &RuntimeServer,
        cancel: &CancellationToken,
    ) -> Result<Arc<dyn McpClient>> {
        let cmd = build_command(server)?;
        let client = StdioClient::connect(&server.name(), cmd, self.init_timeout, cancel).await?;
        Ok(Arc::new(client))
    }
}

/// Fully resolved invocation for one server: runner, argv, and the exact
/// environment the child will see.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CommandPlan {
    pub(crate) runtime: Runtime,
    pub(crate) args: Vec<String>,
    pub(crate) env: Vec<(String, String)>,
}

/// Runner-specific command shape for one server.
///
/// - `npx` gets `-y` ahead of the package so installation never prompts.
/// - `docker` runs `run -i --rm --network host`, receives only the
///   server's own variables as `-e` flags plus `-v` mounts, and never the
///   parent environment.
/// - `uvx`/`python` receive the package and resolved args with the safe
///   parent-inheriting environment.
pub(crate) fn plan_command(
    server: &RuntimeServer,
    parent_env: impl IntoIterator<Item = (String, String)>,
) -> Result<CommandPlan> {
    let (runtime, package_ref) = server.runtime()?;
    let filter = EnvFilter::for_server(&server.entry.name);

    let plan = match runtime {
        Runtime::Docker => {
            let env = filter.isolated_env(&server.context.env);
            let tail = filter.safe_args(&server.resolved_args(), &env);
            let mut args: Vec<String> = ["run", "-i", "--rm", "--network", "host"]
                .iter()
                .map(|s| s.to_string())
                .collect();
            for (key, value) in &env {
                args.push("-e".to_string());
                args.push(format!("{key}={value}"));
            }
            for mount in server.resolved_volumes() {
                if let Some(source) = filter.safe_volume_source(&mount.source, &env) {
                    args.push("-v".to_string());
                    args.push(format!("{source}:{}", mount.container_path));
                }
            }
            args.push(package_ref);
            args.extend(tail);
            CommandPlan {
                runtime,
                args,
                env: Vec::new(),
            }
        }
        Runtime::Npx | Runtime::Uvx | Runtime::Python => {
            let env = filter.inherited_env(parent_env, &server.context.env);
            let tail = filter.safe_args(&server.resolved_args(), &env);
            let mut args = Vec::new();
            if runtime == Runtime::Npx {
                args.push("-y".to_string());
            }
            args.push(package_ref);
            args.extend(tail);
            CommandPlan { runtime, args, env }
        }
    };

    Ok(plan)
}

pub(crate) fn build_command(server: &RuntimeServer) -> Result<Command> {
    let plan = plan_command(server, std::env::vars())?;
    let runner = which::which(plan.runtime.command())
        .with_context(|| format!("runner '{}' not found on PATH", plan.runtime.command()))?;
    let mut cmd = Command::new(runner);
    cmd.args(&plan.args);
    cmd.env_clear();
    cmd.envs(plan.env);
    Ok(cmd)
}

/// Outcome of a fan-out launch: which servers came up, which did not.
#[derive(Debug, Default)]
pub struct LaunchSummary {
    pub launched: Vec<String>,
    pub failures: Vec<(String, String)>,
}

impl LaunchSummary {
    /// Joined startup error, `None` when every server launched.
    pub fn error(&self) -> Option<anyhow::Error> {
        if self.failures.is_empty() {
            return None;
        }
        let joined = self
            .failures
            .iter()
            .map(|(name, reason)| format!("{name}: {reason}"))
            .collect::<Vec<_>>()
            .join("; ");
        Some(anyhow!("failed to launch {} server(s): {joined}", self.failures.len()))
    }
}

/// Owns the fleet: spawns children, registers them, stops them, and
/// applies reload plans. Shared behind an `Arc` by the gateway and the
/// signal handlers.
pub struct Supervisor {
    registry: Arc<ClientRegistry>,
    tracker: Arc<HealthTracker>,
    launcher: Arc<dyn ClientLauncher>,
    options: SupervisorOptions,
    servers: Mutex<HashMap<String, RuntimeServer>>,
}

impl Supervisor {
    pub fn new(
        registry: Arc<ClientRegistry>,
        tracker: Arc<HealthTracker>,
        options: SupervisorOptions,
    ) -> Self {
        let launcher = Arc::new(StdioLauncher::new(options.init_timeout));
        Self::with_launcher(registry, tracker, options, launcher)
    }

    pub fn with_launcher(
        registry: Arc<ClientRegistry>,
        tracker: Arc<HealthTracker>,
        options: SupervisorOptions,
        launcher: Arc<dyn ClientLauncher>,
    ) -> Self {
        Self {
            registry,
            tracker,
            launcher,
            options,
            servers: Mutex::new(HashMap::new()),
        }
    }

    /// Launch every server concurrently. One bad server never cancels the
    /// others; failures are collected into the summary.
    pub async fn launch_all(
        self: &Arc<Self>,
        servers: Vec<RuntimeServer>,
        cancel: &CancellationToken,
    ) -> LaunchSummary {
        let mut set = JoinSet::new();
        for server in servers {
            let this = Arc::clone(self);
            let cancel = cancel.clone();
            set.spawn(async move {
                let name = server.name();
                let result = this.launch_server(server, &cancel).await;
                (name, result)
            });
        }

        let mut summary = LaunchSummary::default();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((name, Ok(()))) => summary.launched.push(name),
                Ok((name, Err(error))) => {
                    tracing::error!(server = %name, "failed to launch MCP server: {error:#}");
                    summary.failures.push((name, format!("{error:#}")));
                }
                Err(error) => {
                    summary
                        .failures
                        .push(("<launch worker>".to_string(), error.to_string()));
                }
            }
        }
        summary.launched.sort();
        summary.failures.sort_by(|a, b| a.0.cmp(&b.0));
        summary
    }

    /// Validate, spawn, initialize, and track one server.
    pub async fn launch_server(
        &self,
        server: RuntimeServer,
        cancel: &CancellationToken,
    ) -> Result<()> {
        server.validate()?;
        let client = self.launcher.launch(&server, cancel).await?;
        let name = server.name();
        // Configured spelling for display; the registry normalizes its key.
        self.registry.add(&server.entry.name, client, &server.entry.tools);
        self.tracker.add(&name);
        self.servers.lock().await.insert(name.clone(), server);
        tracing::info!(server = %name, "MCP server launched");
        Ok(())
    }

    /// Reload-path stop: untrack first so no new requests route here, then
    /// close. A close timeout is an error because the daemon keeps running
    /// and a leaked child would be an observable fault.
    pub async fn stop_server(&self, name: &str) -> Result<()> {
        let name = normalize_name(name);
        let client = self.registry.remove(&name);
        self.tracker.remove(&name);
        self.servers.lock().await.remove(&name);

        let Some(client) = client else {
            return Ok(());
        };
        match timeout(self.options.close_timeout, client.close()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => bail!("failed to close MCP server '{name}': {error}"),
            Err(_) => bail!(
                "closing MCP server '{name}' timed out after {}s",
                self.options.close_timeout.as_secs()
            ),
        }
    }

    /// Shutdown-path stop: every client closed concurrently, each under
    /// its own timeout. Timeouts are logged, never propagated; the process
    /// is about to exit anyway.
    pub async fn shutdown(&self) {
        let mut set = JoinSet::new();
        for name in self.registry.list() {
            let Some(client) = self.registry.remove(&name) else {
                continue;
            };
            self.tracker.remove(&name);
            let close_timeout = self.options.close_timeout;
            set.spawn(async move {
                match timeout(close_timeout, client.close()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(error)) => {
                        tracing::warn!(server = %name, error = %error, "failed to close MCP server");
                    }
                    Err(_) => {
                        tracing::warn!(
                            server = %name,
                            timeout_secs = close_timeout.as_secs(),
                            "closing MCP server timed out"
                        );
                    }
                }
            });
        }
        while set.join_next().await.is_some() {}
        self.servers.lock().await.clear();
    }

    /// Swap a live allow-list without restarting the child.
    pub async fn update_tools(&self, name: &str, tools: &[String]) -> Result<(), DaemonError> {
        self.registry.update_tools(name, tools)?;
        if let Some(stored) = self.servers.lock().await.get_mut(&normalize_name(name)) {
            stored.entry.tools = tools.to_vec();
        }
        Ok(())
    }

    /// The fleet configuration as currently stored.
    pub async fn current_servers(&self) -> Vec<RuntimeServer> {
        self.servers.lock().await.values().cloned().collect()
    }

    /// Diff `proposed` against the running fleet and apply the plan.
    ///
    /// Validation failures abort before anything is touched. Once applying,
    /// sub-step failures accumulate but never stop later steps, and the
    /// stored configuration becomes `proposed` regardless.
    pub async fn reload(
        self: &Arc<Self>,
        proposed: Vec<RuntimeServer>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let validation_errors: Vec<String> = proposed
            .iter()
            .filter_map(|server| server.validate().err().map(|e| e.to_string()))
            .collect();
        if !validation_errors.is_empty() {
            bail!(
                "reload rejected, fleet unchanged: {}",
                validation_errors.join("; ")
            );
        }

        let current = self.current_servers().await;
        let plan = plan_reload(&current, &proposed);
        tracing::info!(
            remove = plan.remove.len(),
            add = plan.add.len(),
            restart = plan.restart.len(),
            update_tools = plan.update_tools.len(),
            unchanged = plan.unchanged.len(),
            "applying reload plan"
        );

        let mut failures = Vec::new();

        for name in &plan.remove {
            if let Err(error) = self.stop_server(name).await {
                failures.push(format!("remove {name}: {error:#}"));
            }
        }
        for server in &plan.update_tools {
            if let Err(error) = self.update_tools(&server.name(), &server.entry.tools).await {
                failures.push(format!("update tools {}: {error}", server.name()));
            }
        }
        for server in &plan.restart {
            if let Err(error) = self.stop_server(&server.name()).await {
                failures.push(format!("restart {}: {error:#}", server.name()));
            }
            if let Err(error) = self.launch_server(server.clone(), cancel).await {
                failures.push(format!("restart {}: {error:#}", server.name()));
            }
        }
        for server in &plan.add {
            if let Err(error) = self.launch_server(server.clone(), cancel).await {
                failures.push(format!("add {}: {error:#}", server.name()));
            }
        }

        let mut stored = self.servers.lock().await;
        *stored = proposed
            .into_iter()
            .map(|server| (server.name(), server))
            .collect();
        drop(stored);

        if failures.is_empty() {
            Ok(())
        } else {
            bail!("reload applied with failures: {}", failures.join("; "))
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
