//! Gateway error types

use thiserror::Error;

/// Errors from the pipeline backend calls
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Json(#[from] serde_json::Error),

    /// Well-formed response with `success: false`
    #[error("{0}")]
    Pipeline(String),

    /// Well-formed success response without the expected payload
    #[error("Response is missing {0}")]
    MissingField(&'static str),
}

/// Failure classes surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Call rejected, non-success HTTP status, or unparseable body
    NetworkOrProtocol,
    /// The pipeline answered but reported a failure or omitted its payload
    PipelineReported,
}

impl GatewayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Network(_) | GatewayError::Status { .. } | GatewayError::Json(_) => {
                ErrorKind::NetworkOrProtocol
            }
            GatewayError::Pipeline(_) | GatewayError::MissingField(_) => ErrorKind::PipelineReported,
        }
    }
}
