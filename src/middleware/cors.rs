use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// Browser clients call the endpoint cross-origin with a bearer token.
pub fn callable_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(Any)
}
