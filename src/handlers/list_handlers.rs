//! HTTP handlers for the manifest endpoint.
//! The body is taken as raw bytes so that a missing or non-UTF-8 body still
//! reaches `ListService` and gets its CORS-carrying 400.

use axum::{body::Bytes, extract::State};

use crate::{
    models::{request::ListRequest, response::HandlerResponse},
    services::list_service::ListService,
};

/// `POST /`: list the caller's downloads.
pub async fn list_files(State(service): State<ListService>, body: Bytes) -> HandlerResponse {
    let body = if body.is_empty() {
        None
    } else {
        String::from_utf8(body.to_vec()).ok()
    };
    let request = ListRequest {
        body,
        is_base64_encoded: false,
    };
    service.handle(&request).await
}

/// `OPTIONS /`: CORS preflight.
pub async fn preflight() -> HandlerResponse {
    HandlerResponse::preflight()
}
