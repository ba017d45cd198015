//! Human-in-the-loop workflow
//!
//! Idle -> awaiting plan -> awaiting approval -> executing -> done, with
//! failure and cancellation paths. [`WorkflowController`] is the pure
//! transition function; [`WorkflowHandle`] runs it on a tokio task and talks
//! to the pipeline gateway.

mod controller;
mod handle;
mod messages;
mod state;

pub use controller::{CANCELLED_MESSAGE, WorkflowController};
pub use handle::{WorkflowHandle, WorkflowResponse};
pub use messages::{Effect, Step, WorkflowCommand, WorkflowError, WorkflowEvent};
pub use state::{FailureContext, Phase, RunFailure, RunState, RunStatus, WorkflowState};
