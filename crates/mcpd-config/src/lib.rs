//! Configuration loading and runtime-server composition.
//!
//! Two TOML documents feed the daemon: `config.toml` holds the static
//! server entries (package, tool allow-list, required arguments, volume
//! declarations) and `secrets.toml` holds each server's execution context
//! (args, env, volume sources). A [`RuntimeServer`] is the union of one
//! entry and its context, validated before launch.

pub mod cache;
pub mod context;
pub mod entry;
pub mod loader;
pub mod registry;
pub mod runtime;

pub use cache::ManifestCache;
pub use context::ExecutionContext;
pub use entry::{ServerEntry, VolumeSpec};
pub use loader::{
    SecretsConfig, StaticConfig, compose, default_cache_dir, default_config_path,
    default_secrets_path,
};
pub use registry::{RegistryEntry, RegistryManifest};
pub use runtime::{Runtime, RuntimeServer, VolumeMount, parse_package};
