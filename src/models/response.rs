//! Response envelope shared by the HTTP server and one-shot event mode.

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

use crate::{errors::ListError, models::manifest::ManifestItem};

pub const ALLOW_HEADERS: &str =
    "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token";
pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "OPTIONS,POST";

/// Content type sent on every response, including JSON manifests.
pub const CONTENT_TYPE: &str = "text/html";

/// A fully rendered response: status, fixed header set and string body.
///
/// Serializes as an API-Gateway proxy result (`statusCode`, `headers`, `body`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HandlerResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        let headers = [
            ("Content-Type", CONTENT_TYPE),
            ("Access-Control-Allow-Headers", ALLOW_HEADERS),
            ("Access-Control-Allow-Origin", ALLOW_ORIGIN),
            ("Access-Control-Allow-Methods", ALLOW_METHODS),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

        Self {
            status_code: status.as_u16(),
            headers,
            body: body.into(),
        }
    }

    /// 200 with the manifest serialized as a JSON array.
    pub fn manifest(items: &[ManifestItem]) -> Self {
        match serde_json::to_string(items) {
            Ok(body) => Self::new(StatusCode::OK, body),
            Err(err) => {
                warn!("failed to serialize manifest: {}", err);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    r#"<h1><b style="color:red">Internal Error</b></h1>"#,
                )
            }
        }
    }

    /// Empty 200 answering a CORS preflight.
    pub fn preflight() -> Self {
        Self::new(StatusCode::OK, "")
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<ListError> for HandlerResponse {
    fn from(err: ListError) -> Self {
        Self::new(err.status(), err.html())
    }
}

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (
                HeaderName::try_from(name.as_str()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!("dropping invalid response header {}", name),
            }
        }

        response
    }
}
