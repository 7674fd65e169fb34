//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage and media host wiring
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use catalog_auth::TokenValidator;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: Arc<AppServices>, validator: Arc<dyn TokenValidator>) -> Router {
    let auth_state = middleware::AuthState { validator };

    // Auth runs only for matched protected routes; reads on the same paths stay public.
    let protected = routes::protected_router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::public_router())
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}

pub use services::AppServices;
