//! Workflow state and snapshots

use std::fmt;

use serde::Serialize;

use crate::domain::{Plan, Stage};
use crate::gateway::ErrorKind;

/// Where the current request is in its lifecycle
///
/// Each state carries exactly the data that is valid in it, so a proposed
/// plan cannot outlive approval and an approved plan cannot leak into the
/// next round.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    /// Plan generation call in flight
    AwaitingPlan { round: u64 },
    /// Plan presented to the user for editing
    AwaitingApproval { round: u64, proposed: Plan },
    /// Execution call in flight
    Executing { round: u64, approved: Plan },
    /// Result delivered; the approved plan stays for read-only display
    Done { approved: Plan },
    Failed { failure: RunFailure },
}

/// Discriminant of [`WorkflowState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    AwaitingPlan,
    AwaitingApproval,
    Executing,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::AwaitingPlan => "awaiting_plan",
            Phase::AwaitingApproval => "awaiting_approval",
            Phase::Executing => "executing",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

impl WorkflowState {
    pub fn phase(&self) -> Phase {
        match self {
            WorkflowState::Idle => Phase::Idle,
            WorkflowState::AwaitingPlan { .. } => Phase::AwaitingPlan,
            WorkflowState::AwaitingApproval { .. } => Phase::AwaitingApproval,
            WorkflowState::Executing { .. } => Phase::Executing,
            WorkflowState::Done { .. } => Phase::Done,
            WorkflowState::Failed { .. } => Phase::Failed,
        }
    }

    /// True while a remote call is outstanding
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            WorkflowState::AwaitingPlan { .. } | WorkflowState::Executing { .. }
        )
    }

    pub fn proposed_plan(&self) -> Option<&Plan> {
        match self {
            WorkflowState::AwaitingApproval { proposed, .. } => Some(proposed),
            _ => None,
        }
    }

    pub fn approved_plan(&self) -> Option<&Plan> {
        match self {
            WorkflowState::Executing { approved, .. } | WorkflowState::Done { approved } => Some(approved),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&RunFailure> {
        match self {
            WorkflowState::Failed { failure } => Some(failure),
            _ => None,
        }
    }
}

/// Which remote call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureContext {
    PlanGeneration,
    PlanExecution,
}

impl fmt::Display for FailureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureContext::PlanGeneration => f.write_str("plan generation"),
            FailureContext::PlanExecution => f.write_str("plan execution"),
        }
    }
}

/// A remote failure as recorded by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunFailure {
    pub context: FailureContext,
    pub kind: ErrorKind,
    /// Underlying message, verbatim
    pub message: String,
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error during {}: {}", self.context, self.message)
    }
}

/// Run state as seen by the rest of the application
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunState {
    pub stage: Stage,
    pub proposed_plan: Option<Plan>,
    pub approved_plan: Option<Plan>,
    pub is_busy: bool,
    pub last_error: Option<RunFailure>,
}

/// Progress snapshot published on every transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunStatus {
    pub phase: Phase,
    pub stage: Stage,
    pub percent: u8,
    pub message: String,
    pub is_busy: bool,
    pub round: u64,
    /// Number of timeline entries so far
    pub timeline_len: usize,
}
