//! Pipeline gateway
//!
//! Adapter between the workflow controller and the remote analysis
//! pipeline: plan generation and plan execution.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod http;
pub mod types;

pub use client::PipelineGateway;
pub use error::{ErrorKind, GatewayError};
pub use http::HttpGateway;
pub use types::{Document, ExecutionOutcome, ExecutionResult};

use crate::config::PipelineConfig;

/// Create the HTTP gateway described by the config
pub fn create_gateway(config: &PipelineConfig) -> Result<Arc<dyn PipelineGateway>, GatewayError> {
    debug!(base_url = %config.base_url, "create_gateway: called");
    Ok(Arc::new(HttpGateway::from_config(config)?))
}
