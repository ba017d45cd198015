//! PipelineGateway trait definition

use async_trait::async_trait;

use super::{ExecutionOutcome, GatewayError};
use crate::domain::Plan;

/// Boundary to the analysis pipeline backend
///
/// Two sequential calls: one proposes a plan for an idea, the other runs an
/// approved plan and returns the finished documents. Implementations do not
/// retry; a failed call is reported to the user, who may resubmit.
#[async_trait]
pub trait PipelineGateway: Send + Sync {
    /// Ask the pipeline to propose a plan for the user's idea
    async fn request_plan(&self, message: &str) -> Result<Plan, GatewayError>;

    /// Run an approved plan
    async fn execute_plan(&self, plan: &Plan) -> Result<ExecutionOutcome, GatewayError>;
}
