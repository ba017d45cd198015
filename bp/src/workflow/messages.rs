//! Workflow events, effects and actor commands

use thiserror::Error;
use tokio::sync::oneshot;

use super::state::RunState;
use crate::domain::{ConversationLog, Plan, TimelineEntry};
use crate::gateway::{ExecutionOutcome, GatewayError};

/// Inputs to the workflow transition function
///
/// User events come from the editing surface; remote events carry the
/// round they answer so late responses can be discarded.
#[derive(Debug)]
pub enum WorkflowEvent {
    /// User submitted an idea
    Submit(String),
    PlanReceived { round: u64, plan: Plan },
    PlanFailed { round: u64, error: GatewayError },
    /// User approved their edited draft
    Confirm(Plan),
    /// User abandoned the proposed plan
    Cancel,
    /// Simulated progress while executing
    ProgressTick,
    ResultReceived { round: u64, outcome: ExecutionOutcome },
    ResultFailed { round: u64, error: GatewayError },
}

impl WorkflowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowEvent::Submit(_) => "submit",
            WorkflowEvent::PlanReceived { .. } => "plan_received",
            WorkflowEvent::PlanFailed { .. } => "plan_failed",
            WorkflowEvent::Confirm(_) => "confirm",
            WorkflowEvent::Cancel => "cancel",
            WorkflowEvent::ProgressTick => "progress_tick",
            WorkflowEvent::ResultReceived { .. } => "result_received",
            WorkflowEvent::ResultFailed { .. } => "result_failed",
        }
    }
}

/// Remote work requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RequestPlan { round: u64, message: String },
    ExecutePlan { round: u64, plan: Plan },
}

/// Result of feeding one event to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Step {
    /// No transition defined for this event in the current state
    Ignored,
    /// State changed, nothing to do remotely
    Applied,
    /// State changed and a remote call must be issued
    Issue(Effect),
}

impl Step {
    pub fn is_applied(&self) -> bool {
        !matches!(self, Step::Ignored)
    }
}

/// Errors from the workflow handle
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Workflow is not running")]
    ChannelClosed,
}

/// Commands sent to the workflow actor
#[derive(Debug)]
pub enum WorkflowCommand {
    Submit {
        text: String,
        reply: oneshot::Sender<bool>,
    },
    Confirm {
        draft: Plan,
        reply: oneshot::Sender<bool>,
    },
    Cancel {
        reply: oneshot::Sender<bool>,
    },
    GetRunState {
        reply: oneshot::Sender<RunState>,
    },
    GetTimeline {
        since: usize,
        reply: oneshot::Sender<Vec<TimelineEntry>>,
    },
    GetLog {
        reply: oneshot::Sender<ConversationLog>,
    },
    /// Completion of a gateway call
    Remote(WorkflowEvent),
    Shutdown,
}
