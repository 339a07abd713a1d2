//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: deal service over the document store and bus, plus the activity feed
//! - `routes/`: HTTP routes + handlers (one file per area of a deal)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent `{error, message, retryable}` responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use dealflow_infra::DealSettings;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Spawns the activity subscriber, so it must be called inside a tokio runtime.
pub async fn build_app(settings: DealSettings) -> Router {
    let services = Arc::new(services::build_services(settings));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
