//! Cross-server isolation engine.
//!
//! One server must never observe another server's secrets, whether those
//! secrets arrive through the parent process environment, through its own
//! configured values, or through `$VAR`-style references smuggled into
//! arguments and volume mounts. The engine is a string-level filter by
//! design; it does not attempt full shell-expansion semantics.
//!
//! Namespace layout:
//! - `MCPD_<NAME>` — application-level variables, never forwarded to children.
//! - `MCPD__<SERVER>__<NAME>` — variables owned by one server, visible only
//!   to that server's child process.

mod env;
mod expand;
mod reference;

pub use env::EnvFilter;
pub use expand::expand_once;

/// Prefix of application-level environment variables.
pub const APP_PREFIX: &str = "MCPD_";

/// Prefix of per-server environment variables.
pub const SERVER_PREFIX: &str = "MCPD__";
