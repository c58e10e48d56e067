//! Shared domain types for the mcpd daemon.

pub mod error;
pub mod health;
pub mod name;

pub use error::DaemonError;
pub use health::{HealthRecord, HealthStatus, format_duration};
pub use name::{env_segment, normalize_name, normalize_tools};
