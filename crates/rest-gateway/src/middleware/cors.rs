//! CORS middleware.
//!
//! Wrapper around tower-http CORS with gateway configuration.

use crate::domain::config::CorsConfig;
use axum::http::HeaderName;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

/// Create CORS layer from gateway config.
///
/// Any method and header are allowed. With credentials enabled, wildcards are
/// not valid CORS answers, so origin, method and headers are mirrored from the
/// request instead.
pub fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    let any_origin = config.allowed_origins.iter().any(|o| o == "*");

    let mut cors = CorsLayer::new();

    cors = if any_origin && config.allow_credentials {
        cors.allow_origin(AllowOrigin::mirror_request())
    } else if any_origin {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    };

    cors = if config.allow_credentials {
        cors.allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        cors.allow_methods(Any).allow_headers(Any)
    };

    if !config.expose_headers.is_empty() {
        let expose: Vec<HeaderName> = config
            .expose_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        cors = cors.expose_headers(expose);
    }

    cors.max_age(Duration::from_secs(config.max_age))
}
