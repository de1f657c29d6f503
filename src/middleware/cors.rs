use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

/// The public careers site and the admin panel live on other origins.
/// Credentials stay off; auth travels in the bearer header, not a cookie.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
}
