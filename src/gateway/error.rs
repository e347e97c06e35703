use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

use super::mapper::MappingError;

/// Every way a mission fetch can fail. Nothing is retried.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No response from the upstream; the client error is passed through as-is
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("[{status}]{status_text}")]
    UpstreamStatus { status: u16, status_text: String },

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("Upstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Upstream request cancelled")]
    Cancelled,
}

impl GatewayError {
    pub fn upstream_status(status: StatusCode) -> Self {
        GatewayError::UpstreamStatus {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }
}
