//! Error type for Runtime API calls.

use agentkit_util::ArgumentError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing credentials: set VOLC_ACCESSKEY and VOLC_SECRETKEY (legacy AGENTKIT_ACCESS_KEY/AGENTKIT_SECRET_KEY are also accepted)")]
    MissingCredentials,

    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid {field} '{value}': expected one of {expected}")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error("{action} failed: {code}: {message}")]
    Service {
        action: String,
        code: String,
        message: String,
        request_id: Option<String>,
    },

    #[error("{action} returned HTTP {status}: {body}")]
    Http { action: String, status: u16, body: String },

    #[error("Network error calling {action}: {source}")]
    Network {
        action: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ApiError {
    /// Vendor error code, when the failure came from the service itself.
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Vendor request id, when the service reported one.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            ApiError::Service { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }
}
