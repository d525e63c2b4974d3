use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

/// Play links are opened from the web app's origin; fall back to any origin
/// when the configured value is not a valid header.
pub fn cors_for_origin(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);
    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            tracing::warn!(origin, "invalid PUBLIC_ORIGIN for CORS, allowing any origin");
            layer.allow_origin(Any)
        }
    }
}
