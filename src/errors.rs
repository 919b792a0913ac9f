use axum::http::StatusCode;
use thiserror::Error;

/// Every way a list request can fail before a manifest is produced.
///
/// Each variant maps to one HTTP status and one HTML headline; the carried
/// detail is for logs only and never reaches the caller.
#[derive(Debug, Error)]
pub enum ListError {
    #[error("improper call: {0}")]
    BadRequest(String),
    #[error("configuration table `{0}` not found")]
    ConfigurationMissing(String),
    #[error("configuration store unavailable: {0}")]
    ConfigurationUnavailable(String),
    #[error("configuration scan failed: {0}")]
    ConfigurationReadError(String),
    #[error("configuration table holds no items")]
    ConfigurationEmpty,
    #[error("configuration table holds {0} items, expected exactly one")]
    ConfigurationAmbiguous(usize),
    #[error("configuration item has no `data-bucket` string")]
    ConfigurationInvalid,
}

impl ListError {
    /// Status code returned to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ListError::ConfigurationUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Short caller-facing description of the failure category.
    pub fn headline(&self) -> &'static str {
        match self {
            ListError::BadRequest(_) => "Improper Call",
            ListError::ConfigurationMissing(_) => "Missing Configuration",
            ListError::ConfigurationUnavailable(_) => "Configuration Unavailable",
            ListError::ConfigurationReadError(_) => "Not properly configured - missing item.",
            ListError::ConfigurationEmpty => "Not properly configured - empty item.",
            ListError::ConfigurationAmbiguous(_) => {
                "Application not properly configured - too many items."
            }
            ListError::ConfigurationInvalid => "Not properly configured - missing data-bucket.",
        }
    }

    /// HTML fragment used as the error response body.
    pub fn html(&self) -> String {
        format!(r#"<h1><b style="color:red">{}</b></h1>"#, self.headline())
    }
}
