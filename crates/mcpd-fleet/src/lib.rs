//! Fleet management: child MCP clients, the registries that track them,
//! the supervisor that launches and stops them, the health scheduler, and
//! the reload planner.

pub mod client;
pub mod health;
pub mod registry;
pub mod reload;
pub mod scheduler;
mod stderr;
pub mod stdio;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ClientError, McpClient};
pub use health::HealthTracker;
pub use registry::ClientRegistry;
pub use reload::{ReloadPlan, plan_reload};
pub use scheduler::{HealthScheduler, SchedulerOptions};
pub use stdio::StdioClient;
pub use supervisor::{ClientLauncher, LaunchSummary, StdioLauncher, Supervisor, SupervisorOptions};
