//! Defines the routes of the download listing service.
//!
//! - `POST    /`        manifest of the caller's downloads
//! - `OPTIONS /`        CORS preflight
//! - `GET     /healthz` liveness
//! - `GET     /readyz`  readiness (configuration store reachable)

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        list_handlers::{list_files, preflight},
    },
    services::list_service::ListService,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build the router. Handlers share a `ListService` as state.
pub fn routes() -> Router<ListService> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/", post(list_files).options(preflight))
}
