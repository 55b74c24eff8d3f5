use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// Browser clients call the API from the console's own origin or a dev server.
pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(Any)
        .expose_headers([header::CONTENT_DISPOSITION])
}
