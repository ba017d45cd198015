//! WorkflowController - the single transition function
//!
//! Every mutation of stage, plans and timeline goes through
//! [`WorkflowController::handle`]. The controller never performs I/O: a
//! transition that needs the pipeline returns an [`Effect`] and the caller
//! feeds the response back in as another event.

use tracing::{debug, info, warn};

use super::messages::{Effect, Step, WorkflowEvent};
use super::state::{FailureContext, RunFailure, RunState, RunStatus, WorkflowState};
use crate::domain::{ConversationLog, Plan, Stage, TimelineEntry, sanitize};
use crate::gateway::{ExecutionOutcome, ExecutionResult, GatewayError};

/// Status message shown after the user cancels a proposed plan
pub const CANCELLED_MESSAGE: &str = "Cancelled by user.";

/// Owns the session: workflow state, stage and conversation log
#[derive(Debug, Default)]
pub struct WorkflowController {
    state: WorkflowState,
    stage: Stage,
    /// Replaces the stage's default status message until the next stage change
    status_override: Option<String>,
    /// Incremented on every accepted submit
    round: u64,
    log: ConversationLog,
}

impl WorkflowController {
    pub fn new() -> Self {
        debug!("WorkflowController::new: called");
        Self::default()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn run_state(&self) -> RunState {
        RunState {
            stage: self.stage,
            proposed_plan: self.state.proposed_plan().cloned(),
            approved_plan: self.state.approved_plan().cloned(),
            is_busy: self.state.is_busy(),
            last_error: self.state.failure().cloned(),
        }
    }

    pub fn status(&self) -> RunStatus {
        let progress = self.stage.progress();
        RunStatus {
            phase: self.state.phase(),
            stage: self.stage,
            percent: progress.percent,
            message: self
                .status_override
                .clone()
                .unwrap_or_else(|| progress.message.to_string()),
            is_busy: self.state.is_busy(),
            round: self.round,
            timeline_len: self.log.len(),
        }
    }

    /// Apply one event
    ///
    /// Events without a transition in the current state are ignored, as
    /// are remote responses whose round is no longer current.
    pub fn handle(&mut self, event: WorkflowEvent) -> Step {
        debug!(phase = %self.state.phase(), event = event.name(), "handle: called");
        match event {
            WorkflowEvent::Submit(text) => self.on_submit(text),
            WorkflowEvent::PlanReceived { round, plan } => self.on_plan_received(round, plan),
            WorkflowEvent::PlanFailed { round, error } => self.on_plan_failed(round, error),
            WorkflowEvent::Confirm(draft) => self.on_confirm(draft),
            WorkflowEvent::Cancel => self.on_cancel(),
            WorkflowEvent::ProgressTick => self.on_progress_tick(),
            WorkflowEvent::ResultReceived { round, outcome } => self.on_result_received(round, outcome),
            WorkflowEvent::ResultFailed { round, error } => self.on_result_failed(round, error),
        }
    }

    fn on_submit(&mut self, text: String) -> Step {
        let message = text.trim();
        if message.is_empty() {
            debug!("on_submit: empty text ignored");
            return Step::Ignored;
        }
        match &self.state {
            WorkflowState::Idle | WorkflowState::Done { .. } | WorkflowState::Failed { .. } => {}
            WorkflowState::AwaitingPlan { .. } | WorkflowState::Executing { .. } => {
                debug!("on_submit: request in flight, ignored");
                return Step::Ignored;
            }
            WorkflowState::AwaitingApproval { .. } => {
                debug!("on_submit: plan awaiting approval, ignored");
                return Step::Ignored;
            }
        }

        self.round += 1;
        let round = self.round;
        let message = message.to_string();

        self.log.append(TimelineEntry::user(message.clone()));
        self.reset_stage(Stage::Init);
        self.advance(Stage::Generate);
        self.state = WorkflowState::AwaitingPlan { round };

        info!(round, "Submitted idea, requesting plan");
        Step::Issue(Effect::RequestPlan { round, message })
    }

    fn on_plan_received(&mut self, round: u64, plan: Plan) -> Step {
        match &self.state {
            WorkflowState::AwaitingPlan { round: current } if *current == round => {}
            WorkflowState::Idle
            | WorkflowState::AwaitingPlan { .. }
            | WorkflowState::AwaitingApproval { .. }
            | WorkflowState::Executing { .. }
            | WorkflowState::Done { .. }
            | WorkflowState::Failed { .. } => return self.discard("plan_received", round),
        }

        info!(
            round,
            queries = plan.research_queries.len(),
            focus = plan.analysis_focus.len(),
            "Plan received, awaiting approval"
        );
        self.state = WorkflowState::AwaitingApproval { round, proposed: plan };
        self.advance(Stage::Approval);
        Step::Applied
    }

    fn on_plan_failed(&mut self, round: u64, error: GatewayError) -> Step {
        match &self.state {
            WorkflowState::AwaitingPlan { round: current } if *current == round => {}
            WorkflowState::Idle
            | WorkflowState::AwaitingPlan { .. }
            | WorkflowState::AwaitingApproval { .. }
            | WorkflowState::Executing { .. }
            | WorkflowState::Done { .. }
            | WorkflowState::Failed { .. } => return self.discard("plan_failed", round),
        }
        self.fail(FailureContext::PlanGeneration, &error);
        Step::Applied
    }

    fn on_confirm(&mut self, draft: Plan) -> Step {
        let round = match &self.state {
            WorkflowState::AwaitingApproval { round, .. } => *round,
            WorkflowState::Idle
            | WorkflowState::AwaitingPlan { .. }
            | WorkflowState::Executing { .. }
            | WorkflowState::Done { .. }
            | WorkflowState::Failed { .. } => {
                debug!("on_confirm: no plan awaiting approval, ignored");
                return Step::Ignored;
            }
        };

        let approved = sanitize(&draft);
        self.log.append(TimelineEntry::snapshot(approved.clone()));
        self.advance(Stage::Research);
        self.state = WorkflowState::Executing {
            round,
            approved: approved.clone(),
        };

        info!(round, queries = approved.research_queries.len(), "Plan approved, executing");
        Step::Issue(Effect::ExecutePlan { round, plan: approved })
    }

    fn on_cancel(&mut self) -> Step {
        match &self.state {
            WorkflowState::AwaitingApproval { .. } => {}
            WorkflowState::Idle
            | WorkflowState::AwaitingPlan { .. }
            | WorkflowState::Executing { .. }
            | WorkflowState::Done { .. }
            | WorkflowState::Failed { .. } => {
                debug!("on_cancel: nothing to cancel, ignored");
                return Step::Ignored;
            }
        }

        self.state = WorkflowState::Idle;
        self.log.append(TimelineEntry::notice(CANCELLED_MESSAGE));
        self.reset_stage(Stage::Init);
        self.status_override = Some(CANCELLED_MESSAGE.to_string());

        info!(round = self.round, "Plan cancelled by user");
        Step::Applied
    }

    fn on_progress_tick(&mut self) -> Step {
        match &self.state {
            WorkflowState::Executing { .. } if self.stage == Stage::Research => {
                self.advance(Stage::Analyze);
                Step::Applied
            }
            WorkflowState::Idle
            | WorkflowState::AwaitingPlan { .. }
            | WorkflowState::AwaitingApproval { .. }
            | WorkflowState::Executing { .. }
            | WorkflowState::Done { .. }
            | WorkflowState::Failed { .. } => Step::Ignored,
        }
    }

    fn on_result_received(&mut self, round: u64, outcome: ExecutionOutcome) -> Step {
        let approved = match &mut self.state {
            WorkflowState::Executing {
                round: current,
                approved,
            } if *current == round => std::mem::take(approved),
            WorkflowState::Idle
            | WorkflowState::AwaitingPlan { .. }
            | WorkflowState::AwaitingApproval { .. }
            | WorkflowState::Executing { .. }
            | WorkflowState::Done { .. }
            | WorkflowState::Failed { .. } => return self.discard("result_received", round),
        };

        let ExecutionOutcome { result, message } = outcome;
        match result {
            ExecutionResult::Documents(documents) => {
                info!(round, count = documents.len(), "Execution finished with documents");
                for document in documents {
                    self.log
                        .append(TimelineEntry::document(document.filename, document.content));
                }
            }
            ExecutionResult::Text(text) => {
                info!(round, text_len = text.len(), "Execution finished with text");
                self.log.append(TimelineEntry::agent(text));
            }
        }

        self.state = WorkflowState::Done { approved };
        self.advance(Stage::Completed);
        self.status_override = message.filter(|m| !m.trim().is_empty());
        Step::Applied
    }

    fn on_result_failed(&mut self, round: u64, error: GatewayError) -> Step {
        match &self.state {
            WorkflowState::Executing { round: current, .. } if *current == round => {}
            WorkflowState::Idle
            | WorkflowState::AwaitingPlan { .. }
            | WorkflowState::AwaitingApproval { .. }
            | WorkflowState::Executing { .. }
            | WorkflowState::Done { .. }
            | WorkflowState::Failed { .. } => return self.discard("result_failed", round),
        }
        self.fail(FailureContext::PlanExecution, &error);
        Step::Applied
    }

    /// Enter `Failed`, dropping any plan held by the previous state
    fn fail(&mut self, context: FailureContext, error: &GatewayError) {
        let failure = RunFailure {
            context,
            kind: error.kind(),
            message: error.to_string(),
        };
        warn!(round = self.round, kind = ?failure.kind, error = %failure.message, "{} failed", context);
        self.log.append(TimelineEntry::agent(failure.to_string()));
        self.reset_stage(Stage::Error);
        self.state = WorkflowState::Failed { failure };
    }

    fn discard(&self, event: &str, round: u64) -> Step {
        debug!(
            event,
            round,
            current_round = self.round,
            phase = %self.state.phase(),
            "discard: stale or unexpected response"
        );
        Step::Ignored
    }

    /// Move the stage forward; regressions are ignored
    fn advance(&mut self, next: Stage) {
        if next < self.stage {
            warn!(from = %self.stage, to = %next, "advance: ignoring stage regression");
            return;
        }
        self.stage = next;
        self.status_override = None;
    }

    fn reset_stage(&mut self, stage: Stage) {
        self.stage = stage;
        self.status_override = None;
    }
}
