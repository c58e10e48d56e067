//! CORS middleware construction.

use axum::http::{HeaderName, HeaderValue, Method};
use serde::Deserialize;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

/// Operator-facing CORS settings. Disabled by default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub allow_origins: Vec<String>,
    #[serde(default)]
    pub allow_methods: Vec<String>,
    #[serde(default)]
    pub allow_headers: Vec<String>,
    #[serde(default)]
    pub allow_credentials: bool,
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

/// Build the middleware, or `None` when CORS is off.
///
/// A wildcard origin wins over credentials: the credentials flag is forced
/// off with a warning, never the other way around. Origin strings are
/// trimmed before parsing; unparseable entries are skipped with a warning.
pub fn cors_layer(config: &CorsConfig) -> Option<CorsLayer> {
    if !config.enabled {
        return None;
    }

    let origins: Vec<&str> = config
        .allow_origins
        .iter()
        .map(|origin| origin.trim())
        .filter(|origin| !origin.is_empty())
        .collect();
    let wildcard = origins.iter().any(|origin| *origin == "*");

    let mut layer = CorsLayer::new();

    if wildcard {
        layer = layer.allow_origin(Any);
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "skipping unparseable CORS origin");
                    None
                }
            })
            .collect();
        layer = layer.allow_origin(AllowOrigin::list(parsed));
    }

    let methods: Vec<Method> = config
        .allow_methods
        .iter()
        .filter_map(|method| Method::from_bytes(method.trim().as_bytes()).ok())
        .collect();
    if !methods.is_empty() {
        layer = layer.allow_methods(AllowMethods::list(methods));
    }

    let headers: Vec<HeaderName> = config
        .allow_headers
        .iter()
        .filter_map(|header| header.trim().parse::<HeaderName>().ok())
        .collect();
    if !headers.is_empty() {
        layer = layer.allow_headers(AllowHeaders::list(headers));
    }

    let credentials = config.allow_credentials && !wildcard;
    if config.allow_credentials && wildcard {
        tracing::warn!("wildcard CORS origin requested with credentials; credentials disabled");
    }
    layer = layer.allow_credentials(credentials);

    if let Some(secs) = config.max_age_secs {
        layer = layer.max_age(Duration::from_secs(secs));
    }

    Some(layer)
}
