//! Daemon bootstrap and lifetime.
//!
//! Wiring order: load configs → launch the fleet → start the health
//! scheduler → serve the gateway → wait for a signal. One root
//! cancellation token governs everything; SIGHUP re-reads both config
//! documents and hands the result to the reload planner.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use mcpd_config::{SecretsConfig, StaticConfig, compose};
use mcpd_fleet::{
    ClientRegistry, HealthScheduler, HealthTracker, SchedulerOptions, Supervisor,
    SupervisorOptions,
};
use mcpd_gateway::{AppState, CorsConfig, GatewayOptions};
use tokio_util::sync::CancellationToken;

use crate::cli::DaemonArgs;

pub async fn run(args: DaemonArgs) -> Result<()> {
    let config_path = args
        .config_file
        .unwrap_or_else(mcpd_config::default_config_path);
    let secrets_path = args
        .secrets_file
        .unwrap_or_else(mcpd_config::default_secrets_path);

    let servers = load_servers(&config_path, &secrets_path)?;
    if servers.is_empty() {
        tracing::warn!(
            config = %config_path.display(),
            "no MCP servers configured; the gateway will serve an empty fleet"
        );
    }

    let root = CancellationToken::new();
    let registry = Arc::new(ClientRegistry::new());
    let tracker = Arc::new(HealthTracker::new());
    let supervisor = Arc::new(Supervisor::new(
        registry.clone(),
        tracker.clone(),
        SupervisorOptions::default(),
    ));

    let configured = servers.len();
    let summary = supervisor.launch_all(servers, &root).await;
    if let Some(error) = summary.error() {
        if summary.launched.is_empty() && configured > 0 {
            return Err(error.context("no MCP server could be launched"));
        }
        tracing::warn!("daemon starting degraded: {error:#}");
    }

    let scheduler = HealthScheduler::new(
        registry.clone(),
        tracker.clone(),
        SchedulerOptions::default(),
    );
    let scheduler_cancel = root.child_token();
    let scheduler_task = tokio::spawn(async move {
        // Returns an error on cancellation; that is the normal exit.
        if let Err(error) = scheduler.run(scheduler_cancel).await {
            tracing::debug!("health scheduler stopped: {error}");
        }
    });

    let state = Arc::new(AppState::new(registry.clone(), tracker.clone()));
    let app = mcpd_gateway::router(state, &CorsConfig::default());
    let gateway_options = GatewayOptions {
        addr: args.addr,
        ..GatewayOptions::default()
    };
    let gateway_cancel = root.child_token();
    let mut gateway_task =
        tokio::spawn(
            async move { mcpd_gateway::serve(app, gateway_options, gateway_cancel).await },
        );

    // Installed once so a SIGHUP arriving mid-reload stays queued for the
    // next loop iteration instead of being lost with a dropped stream.
    let mut reload_signal = ReloadSignal::install();

    let run_result = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for shutdown signal")?;
                tracing::info!("shutdown signal received");
                break Ok(());
            }
            _ = reload_signal.requested() => {
                match reload(&supervisor, &config_path, &secrets_path, &root).await {
                    Ok(()) => tracing::info!("configuration reload applied"),
                    Err(error) => tracing::error!("configuration reload failed: {error:#}"),
                }
            }
            result = &mut gateway_task => {
                // The gateway only returns early on a bind/serve failure.
                break result.context("gateway task panicked")?;
            }
        }
    };

    root.cancel();
    if !gateway_task.is_finished() {
        if let Err(error) = gateway_task.await {
            tracing::debug!("gateway join failed: {error}");
        }
    }
    supervisor.shutdown().await;
    let _ = scheduler_task.await;

    run_result
}

fn load_servers(
    config_path: &Path,
    secrets_path: &Path,
) -> Result<Vec<mcpd_config::RuntimeServer>> {
    let config = StaticConfig::load(config_path)?;
    let secrets = SecretsConfig::load(secrets_path)?;
    Ok(compose(&config, &secrets))
}

async fn reload(
    supervisor: &Arc<Supervisor>,
    config_path: &Path,
    secrets_path: &Path,
    root: &CancellationToken,
) -> Result<()> {
    let proposed = load_servers(config_path, secrets_path)?;
    supervisor.reload(proposed, root).await
}

/// Long-lived SIGHUP listener. On platforms without unix signals, or when
/// installation fails, `requested` never resolves.
struct ReloadSignal {
    #[cfg(unix)]
    hangup: Option<tokio::signal::unix::Signal>,
}

impl ReloadSignal {
    fn install() -> Self {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let hangup = match signal(SignalKind::hangup()) {
                Ok(hangup) => Some(hangup),
                Err(error) => {
                    tracing::warn!(error = %error, "failed to install SIGHUP handler");
                    None
                }
            };
            Self { hangup }
        }

        #[cfg(not(unix))]
        {
            Self {}
        }
    }

    /// Resolves when the operator asks for a config reload.
    async fn requested(&mut self) {
        #[cfg(unix)]
        {
            if let Some(hangup) = self.hangup.as_mut() {
                if hangup.recv().await.is_some() {
                    return;
                }
                // Stream closed; stop polling it.
                self.hangup = None;
            }
            std::future::pending::<()>().await
        }

        #[cfg(not(unix))]
        {
            std::future::pending::<()>().await
        }
    }
}
