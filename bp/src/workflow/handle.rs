//! WorkflowHandle - actor that owns the controller
//!
//! One task owns the [`WorkflowController`]. User actions arrive as commands
//! with oneshot replies; gateway calls run in their own tasks and report
//! back over the same channel, so every transition happens on the actor.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::controller::WorkflowController;
use super::messages::{Effect, Step, WorkflowCommand, WorkflowError, WorkflowEvent};
use super::state::{Phase, RunState, RunStatus};
use crate::config::WorkflowConfig;
use crate::domain::{ConversationLog, Plan, TimelineEntry};
use crate::gateway::PipelineGateway;

pub type WorkflowResponse<T> = Result<T, WorkflowError>;

/// Handle to send commands to the workflow actor
#[derive(Clone)]
pub struct WorkflowHandle {
    tx: mpsc::Sender<WorkflowCommand>,
    status_rx: watch::Receiver<RunStatus>,
}

impl WorkflowHandle {
    /// Spawn a new workflow actor
    ///
    /// The actor stops on [`shutdown`](Self::shutdown) or once every handle
    /// is dropped and no gateway call is outstanding.
    pub fn spawn(gateway: Arc<dyn PipelineGateway>, config: WorkflowConfig) -> Self {
        debug!(?config, "spawn: called");
        let (tx, rx) = mpsc::channel(64);

        let controller = WorkflowController::new();
        let (status_tx, status_rx) = watch::channel(controller.status());

        let actor = WorkflowActor {
            controller,
            gateway,
            config,
            tx: tx.downgrade(),
            status_tx,
        };
        tokio::spawn(actor.run(rx));

        info!("Workflow spawned");
        Self { tx, status_rx }
    }

    /// Submit an idea; false when the controller rejected it
    pub async fn submit(&self, text: impl Into<String>) -> WorkflowResponse<bool> {
        let text = text.into();
        debug!(text_len = text.len(), "submit: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(WorkflowCommand::Submit { text, reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| WorkflowError::ChannelClosed)
    }

    /// Approve the user's edited draft of the proposed plan
    pub async fn confirm(&self, draft: Plan) -> WorkflowResponse<bool> {
        debug!("confirm: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(WorkflowCommand::Confirm { draft, reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| WorkflowError::ChannelClosed)
    }

    /// Abandon the proposed plan
    pub async fn cancel(&self) -> WorkflowResponse<bool> {
        debug!("cancel: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(WorkflowCommand::Cancel { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| WorkflowError::ChannelClosed)
    }

    pub async fn run_state(&self) -> WorkflowResponse<RunState> {
        debug!("run_state: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(WorkflowCommand::GetRunState { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| WorkflowError::ChannelClosed)
    }

    /// Every timeline entry so far
    pub async fn timeline(&self) -> WorkflowResponse<Vec<TimelineEntry>> {
        self.timeline_since(0).await
    }

    /// Timeline entries appended at or after `index`
    pub async fn timeline_since(&self, index: usize) -> WorkflowResponse<Vec<TimelineEntry>> {
        debug!(index, "timeline_since: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(WorkflowCommand::GetTimeline {
            since: index,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| WorkflowError::ChannelClosed)
    }

    /// Copy of the whole conversation log, for saving and export
    pub async fn log_snapshot(&self) -> WorkflowResponse<ConversationLog> {
        debug!("log_snapshot: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(WorkflowCommand::GetLog { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| WorkflowError::ChannelClosed)
    }

    /// Latest published status
    pub fn status(&self) -> RunStatus {
        self.status_rx.borrow().clone()
    }

    /// Receiver notified on every status change
    pub fn subscribe(&self) -> watch::Receiver<RunStatus> {
        self.status_rx.clone()
    }

    /// Wait until no remote call is outstanding
    pub async fn wait_until_settled(&self) -> WorkflowResponse<RunStatus> {
        debug!("wait_until_settled: called");
        let mut rx = self.status_rx.clone();
        let status = rx
            .wait_for(|status| !status.is_busy)
            .await
            .map_err(|_| WorkflowError::ChannelClosed)?
            .clone();
        Ok(status)
    }

    /// Stop the actor
    pub async fn shutdown(&self) -> WorkflowResponse<()> {
        debug!("shutdown: called");
        self.send(WorkflowCommand::Shutdown).await
    }

    async fn send(&self, command: WorkflowCommand) -> WorkflowResponse<()> {
        self.tx.send(command).await.map_err(|_| WorkflowError::ChannelClosed)
    }
}

struct WorkflowActor {
    controller: WorkflowController,
    gateway: Arc<dyn PipelineGateway>,
    config: WorkflowConfig,
    /// Weak so dropped handles end the actor
    tx: mpsc::WeakSender<WorkflowCommand>,
    status_tx: watch::Sender<RunStatus>,
}

impl WorkflowActor {
    async fn run(mut self, mut rx: mpsc::Receiver<WorkflowCommand>) {
        debug!("WorkflowActor::run: called");
        let mut ticker = tokio::time::interval(self.config.progress_tick());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = rx.recv() => {
                    let Some(command) = command else {
                        debug!("WorkflowActor::run: all senders dropped");
                        break;
                    };
                    if !self.handle_command(command, &mut ticker) {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if self.controller.state().phase() == Phase::Executing {
                        self.dispatch(WorkflowEvent::ProgressTick, &mut ticker);
                    }
                }
            }
        }

        info!("Workflow actor stopped");
    }

    /// Returns false when the actor should stop
    fn handle_command(&mut self, command: WorkflowCommand, ticker: &mut Interval) -> bool {
        match command {
            WorkflowCommand::Submit { text, reply } => {
                let applied = self.dispatch(WorkflowEvent::Submit(text), ticker);
                let _ = reply.send(applied);
            }
            WorkflowCommand::Confirm { draft, reply } => {
                let applied = self.dispatch(WorkflowEvent::Confirm(draft), ticker);
                let _ = reply.send(applied);
            }
            WorkflowCommand::Cancel { reply } => {
                let applied = self.dispatch(WorkflowEvent::Cancel, ticker);
                let _ = reply.send(applied);
            }
            WorkflowCommand::GetRunState { reply } => {
                let _ = reply.send(self.controller.run_state());
            }
            WorkflowCommand::GetTimeline { since, reply } => {
                let entries = self.controller.log().since(since).cloned().collect();
                let _ = reply.send(entries);
            }
            WorkflowCommand::GetLog { reply } => {
                let _ = reply.send(self.controller.log().clone());
            }
            WorkflowCommand::Remote(event) => {
                self.dispatch(event, ticker);
            }
            WorkflowCommand::Shutdown => {
                info!("Workflow shutting down");
                return false;
            }
        }
        true
    }

    /// Feed one event to the controller, start any effect, publish status
    fn dispatch(&mut self, event: WorkflowEvent, ticker: &mut Interval) -> bool {
        let step = self.controller.handle(event);
        let applied = step.is_applied();
        if let Step::Issue(effect) = step {
            if matches!(effect, Effect::ExecutePlan { .. }) {
                // First simulated progress step comes one full tick after approval
                ticker.reset();
            }
            self.start(effect);
        }
        if applied {
            self.status_tx.send_replace(self.controller.status());
        }
        applied
    }

    /// Run a gateway call in its own task
    fn start(&self, effect: Effect) {
        let Some(tx) = self.tx.upgrade() else {
            warn!(?effect, "start: no handles left, dropping effect");
            return;
        };
        let gateway = Arc::clone(&self.gateway);

        match effect {
            Effect::RequestPlan { round, message } => {
                tokio::spawn(async move {
                    let event = match gateway.request_plan(&message).await {
                        Ok(plan) => WorkflowEvent::PlanReceived { round, plan },
                        Err(error) => WorkflowEvent::PlanFailed { round, error },
                    };
                    report(&tx, event).await;
                });
            }
            Effect::ExecutePlan { round, plan } => {
                let delay = self.config.result_delay();
                tokio::spawn(async move {
                    let event = match gateway.execute_plan(&plan).await {
                        Ok(outcome) => {
                            if !delay.is_zero() {
                                tokio::time::sleep(delay).await;
                            }
                            WorkflowEvent::ResultReceived { round, outcome }
                        }
                        Err(error) => WorkflowEvent::ResultFailed { round, error },
                    };
                    report(&tx, event).await;
                });
            }
        }
    }
}

async fn report(tx: &mpsc::Sender<WorkflowCommand>, event: WorkflowEvent) {
    debug!(event = event.name(), "report: called");
    if tx.send(WorkflowCommand::Remote(event)).await.is_err() {
        debug!("report: workflow stopped, response dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Stage;
    use crate::gateway::client::mock::MockGateway;
    use crate::gateway::{Document, ExecutionOutcome, GatewayError};
    use std::time::Duration;

    fn sample_plan() -> Plan {
        Plan::with_default_files(["market size", "competitors"], ["pricing"])
    }

    fn spawn(mock: MockGateway) -> (WorkflowHandle, Arc<MockGateway>) {
        let mock = Arc::new(mock);
        let handle = WorkflowHandle::spawn(mock.clone(), WorkflowConfig::immediate());
        (handle, mock)
    }

    async fn wait_for_phase(handle: &WorkflowHandle, phase: Phase) -> RunStatus {
        let mut rx = handle.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.phase == phase))
            .await
            .expect("timed out waiting for phase")
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn test_submit_then_plan_awaits_approval() {
        let (handle, mock) = spawn(MockGateway::new().push_plan(Ok(sample_plan())));

        assert!(handle.submit("coffee for offices").await.unwrap());
        let status = handle.wait_until_settled().await.unwrap();

        assert_eq!(status.phase, Phase::AwaitingApproval);
        assert_eq!(status.stage, Stage::Approval);
        assert_eq!(mock.plan_requests(), vec!["coffee for offices".to_string()]);

        let run = handle.run_state().await.unwrap();
        assert_eq!(run.proposed_plan, Some(sample_plan()));
        assert!(!run.is_busy);
    }

    #[tokio::test]
    async fn test_full_round_with_documents() {
        let outcome = ExecutionOutcome::documents(vec![
            Document {
                filename: "roadmap.md".to_string(),
                content: "# Roadmap".to_string(),
            },
            Document {
                filename: "strategy.md".to_string(),
                content: "# Strategy".to_string(),
            },
        ]);
        let (handle, mock) = spawn(
            MockGateway::new()
                .push_plan(Ok(sample_plan()))
                .push_execution(Ok(outcome)),
        );

        handle.submit("idea").await.unwrap();
        handle.wait_until_settled().await.unwrap();

        let mut draft = sample_plan();
        draft.research_queries.push("  market size ".to_string());
        assert!(handle.confirm(draft).await.unwrap());

        let status = handle.wait_until_settled().await.unwrap();
        assert_eq!(status.phase, Phase::Done);
        assert_eq!(status.percent, 100);

        // Sanitized before execution
        assert_eq!(mock.executed(), vec![sample_plan()]);

        let timeline = handle.timeline().await.unwrap();
        let kinds: Vec<&str> = timeline.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec!["user_text", "plan_snapshot", "agent_document", "agent_document"]
        );
        assert_eq!(status.timeline_len, 4);

        let tail = handle.timeline_since(2).await.unwrap();
        assert_eq!(tail.len(), 2);

        let log = handle.log_snapshot().await.unwrap();
        assert_eq!(log.documents().count(), 2);
    }

    #[tokio::test]
    async fn test_submit_rejected_while_busy() {
        let (handle, mock) = spawn(
            MockGateway::new()
                .with_delay(Duration::from_millis(100))
                .push_plan(Ok(sample_plan())),
        );

        assert!(handle.submit("first").await.unwrap());
        assert!(!handle.submit("second").await.unwrap());
        handle.wait_until_settled().await.unwrap();

        assert_eq!(mock.plan_requests(), vec!["first".to_string()]);
        assert_eq!(handle.timeline().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_plan_failure_settles_failed() {
        let (handle, _mock) =
            spawn(MockGateway::new().push_plan(Err(GatewayError::Pipeline("boom".to_string()))));

        handle.submit("idea").await.unwrap();
        let status = handle.wait_until_settled().await.unwrap();

        assert_eq!(status.phase, Phase::Failed);
        assert_eq!(status.stage, Stage::Error);
        let run = handle.run_state().await.unwrap();
        assert!(run.last_error.unwrap().message.contains("boom"));
        let timeline = handle.timeline().await.unwrap();
        assert_eq!(timeline.last().and_then(|e| e.text()), Some("Error during plan generation: boom"));
    }

    #[tokio::test]
    async fn test_cancel_returns_to_idle() {
        let (handle, mock) = spawn(MockGateway::new().push_plan(Ok(sample_plan())));

        handle.submit("idea").await.unwrap();
        wait_for_phase(&handle, Phase::AwaitingApproval).await;

        assert!(handle.cancel().await.unwrap());
        let status = handle.status();
        assert_eq!(status.phase, Phase::Idle);
        assert_eq!(status.message, "Cancelled by user.");
        assert!(mock.executed().is_empty());

        // Nothing left to cancel
        assert!(!handle.cancel().await.unwrap());
    }

    #[tokio::test]
    async fn test_progress_tick_reaches_analyze() {
        let (handle, _mock) = spawn(
            MockGateway::new()
                .with_delay(Duration::from_millis(300))
                .push_plan(Ok(sample_plan()))
                .push_execution(Ok(ExecutionOutcome::text("report"))),
        );

        handle.submit("idea").await.unwrap();
        wait_for_phase(&handle, Phase::AwaitingApproval).await;
        handle.confirm(sample_plan()).await.unwrap();

        let mut rx = handle.subscribe();
        let status = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.stage == Stage::Analyze))
            .await
            .expect("no progress tick")
            .unwrap()
            .clone();
        assert_eq!(status.percent, 80);
        assert!(status.is_busy);

        let status = handle.wait_until_settled().await.unwrap();
        assert_eq!(status.stage, Stage::Completed);
    }

    #[tokio::test]
    async fn test_shutdown_closes_channel() {
        let (handle, _mock) = spawn(MockGateway::new());

        handle.shutdown().await.unwrap();
        // Give the actor a moment to exit
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(matches!(handle.submit("idea").await, Err(WorkflowError::ChannelClosed)));
    }
}
