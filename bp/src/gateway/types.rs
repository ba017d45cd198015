//! Wire types for the pipeline backend
//!
//! Both calls are JSON request/response. Parsing into domain types lives
//! here so it can be tested without a server.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::GatewayError;
use crate::domain::{Plan, default_output_files};

/// A document produced by the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub filename: String,
    /// Markdown text
    pub content: String,
}

/// Successful execution payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    Documents(Vec<Document>),
    Text(String),
}

/// Parsed execution response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub result: ExecutionResult,
    /// Optional status message from the server
    pub message: Option<String>,
}

impl ExecutionOutcome {
    pub fn documents(documents: Vec<Document>) -> Self {
        Self {
            result: ExecutionResult::Documents(documents),
            message: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            result: ExecutionResult::Text(text.into()),
            message: None,
        }
    }
}

/// Plan generation request body
#[derive(Debug, Serialize)]
pub struct PlanRequest<'a> {
    pub message: &'a str,
}

/// Plan generation response body
#[derive(Debug, Deserialize)]
pub struct PlanResponse {
    #[serde(default)]
    pub success: bool,
    pub plan: Option<WirePlan>,
    pub error: Option<String>,
}

/// Plan as the backend sends it
#[derive(Debug, Deserialize)]
pub struct WirePlan {
    #[serde(default)]
    pub research_queries: Vec<String>,
    #[serde(default)]
    pub analysis_focus: Vec<String>,
    pub output_files: Option<Vec<String>>,
    pub output_format: Option<String>,
}

/// Plan execution request body
#[derive(Debug, Serialize)]
pub struct ExecuteRequest {
    pub plan: ExecutePlanBody,
}

/// Plan as the execution call expects it
#[derive(Debug, Serialize)]
pub struct ExecutePlanBody {
    pub research_queries: Vec<String>,
    pub analysis_focus: Vec<String>,
    /// Newline-joined output filenames
    pub output_format: String,
}

/// Plan execution response body
#[derive(Debug, Deserialize)]
pub struct ExecuteResponse {
    #[serde(default)]
    pub success: bool,
    pub documents: Option<Vec<Document>>,
    pub result: Option<String>,
    pub error: Option<String>,
    pub message: Option<String>,
}

/// Error-only view of a body, used for non-2xx responses
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: Option<String>,
}

impl ExecuteRequest {
    pub fn from_plan(plan: &Plan) -> Self {
        Self {
            plan: ExecutePlanBody {
                research_queries: plan.research_queries.clone(),
                analysis_focus: plan.analysis_focus.clone(),
                output_format: plan.output_format(),
            },
        }
    }
}

impl WirePlan {
    /// Convert to a domain plan
    ///
    /// `output_files` wins over `output_format`; when neither is present the
    /// default deliverables are proposed.
    pub fn into_plan(self) -> Plan {
        let output_files = match (self.output_files, self.output_format) {
            (Some(files), _) => files,
            (None, Some(format)) => format.lines().map(str::to_string).collect(),
            (None, None) => {
                debug!("into_plan: no output files proposed, using defaults");
                default_output_files()
            }
        };

        Plan {
            research_queries: self.research_queries,
            analysis_focus: self.analysis_focus,
            output_files,
        }
    }
}

/// Interpret a plan generation response body
pub fn parse_plan_response(body: &str) -> Result<Plan, GatewayError> {
    debug!(body_len = %body.len(), "parse_plan_response: called");
    let response: PlanResponse = serde_json::from_str(body)?;

    if !response.success {
        debug!("parse_plan_response: pipeline reported failure");
        return Err(pipeline_failure(response.error));
    }

    response
        .plan
        .map(WirePlan::into_plan)
        .ok_or(GatewayError::MissingField("plan"))
}

/// Interpret a plan execution response body
///
/// A non-empty `documents` list takes precedence over `result`.
pub fn parse_execute_response(body: &str) -> Result<ExecutionOutcome, GatewayError> {
    debug!(body_len = %body.len(), "parse_execute_response: called");
    let response: ExecuteResponse = serde_json::from_str(body)?;

    if !response.success {
        debug!("parse_execute_response: pipeline reported failure");
        return Err(pipeline_failure(response.error));
    }

    let result = match (response.documents, response.result) {
        (Some(documents), _) if !documents.is_empty() => {
            debug!(count = %documents.len(), "parse_execute_response: documents");
            ExecutionResult::Documents(documents)
        }
        (_, Some(text)) => {
            debug!("parse_execute_response: plain result");
            ExecutionResult::Text(text)
        }
        _ => return Err(GatewayError::MissingField("documents or result")),
    };

    Ok(ExecutionOutcome {
        result,
        message: response.message,
    })
}

/// Message for a non-2xx response: the envelope's `error` if present, else the raw body
pub fn status_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error)
        .unwrap_or_else(|| body.trim().to_string())
}

fn pipeline_failure(error: Option<String>) -> GatewayError {
    GatewayError::Pipeline(error.unwrap_or_else(|| "The pipeline reported a failure without details".to_string()))
}
