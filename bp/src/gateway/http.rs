//! HTTP implementation of the pipeline gateway
//!
//! Plain JSON request/response over reqwest. No retries: a failed call is
//! surfaced to the user, who may resubmit.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::types::{ExecuteRequest, PlanRequest, parse_execute_response, parse_plan_response, status_message};
use super::{ExecutionOutcome, GatewayError, PipelineGateway};
use crate::config::PipelineConfig;
use crate::domain::Plan;

/// Pipeline backend reached over HTTP
pub struct HttpGateway {
    http: Client,
    plan_url: String,
    execute_url: String,
}

impl HttpGateway {
    /// Create a gateway from configuration
    pub fn from_config(config: &PipelineConfig) -> Result<Self, GatewayError> {
        debug!(?config, "from_config: called");
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(GatewayError::Network)?;

        Ok(Self {
            http,
            plan_url: config.plan_url(),
            execute_url: config.execute_url(),
        })
    }

    /// POST a JSON body and return the response text of a 2xx reply
    async fn post_json<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<String, GatewayError> {
        debug!(%url, "post_json: called");
        let response = self
            .http
            .post(url)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = status_message(&text);
            warn!(status = status.as_u16(), %message, "post_json: non-success status");
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message,
            });
        }

        debug!(status = status.as_u16(), body_len = %text.len(), "post_json: success");
        Ok(text)
    }
}

#[async_trait]
impl PipelineGateway for HttpGateway {
    async fn request_plan(&self, message: &str) -> Result<Plan, GatewayError> {
        debug!(message_len = %message.len(), "request_plan: called");
        let body = self.post_json(&self.plan_url, &PlanRequest { message }).await?;
        parse_plan_response(&body)
    }

    async fn execute_plan(&self, plan: &Plan) -> Result<ExecutionOutcome, GatewayError> {
        debug!(queries = %plan.research_queries.len(), "execute_plan: called");
        let body = self
            .post_json(&self.execute_url, &ExecuteRequest::from_plan(plan))
            .await?;
        parse_execute_response(&body)
    }
}
