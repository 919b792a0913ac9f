//! Inbound request envelope and the JSON body it carries.

use base64::{Engine as _, engine::general_purpose};
use serde::Deserialize;
use std::borrow::Cow;

use crate::errors::ListError;

/// API-Gateway-style request envelope. Only the fields the handler reads are modelled.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    /// Raw request body, expected to hold `{"uid": "..."}`.
    #[serde(default)]
    pub body: Option<String>,

    /// Whether `body` is standard base64 encoded.
    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[derive(Debug, Deserialize)]
struct ListBody {
    uid: String,
}

impl ListRequest {
    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            is_base64_encoded: false,
        }
    }

    /// Extract and validate the user id from the body.
    ///
    /// The id becomes a single key segment, so it must be non-empty and free of `/`.
    pub fn uid(&self) -> Result<String, ListError> {
        let raw = self
            .body
            .as_deref()
            .ok_or_else(|| ListError::BadRequest("request has no body".into()))?;

        let text: Cow<'_, str> = if self.is_base64_encoded {
            let bytes = general_purpose::STANDARD
                .decode(raw)
                .map_err(|err| ListError::BadRequest(format!("body is not base64: {}", err)))?;
            let decoded = String::from_utf8(bytes)
                .map_err(|_| ListError::BadRequest("body is not valid UTF-8".into()))?;
            Cow::Owned(decoded)
        } else {
            Cow::Borrowed(raw)
        };

        let body: ListBody = serde_json::from_str(&text)
            .map_err(|err| ListError::BadRequest(format!("unreadable body: {}", err)))?;

        if body.uid.is_empty() {
            return Err(ListError::BadRequest("uid is empty".into()));
        }
        if body.uid.contains('/') {
            return Err(ListError::BadRequest(format!(
                "uid `{}` contains a path separator",
                body.uid
            )));
        }

        Ok(body.uid)
    }
}
