//! Bizplan - human-in-the-loop business idea analysis
//!
//! A client for a multi-stage analysis pipeline. The user describes a
//! business idea, the pipeline proposes a research plan, the user edits and
//! approves it, and the pipeline executes it into Markdown documents.
//!
//! # Core Concepts
//!
//! - **Approval Gate**: Nothing is researched until the user confirms a plan
//! - **Single Writer**: Every state change goes through one transition function
//! - **Append-only Timeline**: The conversation is never rewritten
//! - **Local Progress**: Progress is derived from the stage, not pushed by the server
//!
//! # Modules
//!
//! - [`domain`] - Plans, sanitization, editing, stages and the timeline
//! - [`gateway`] - Pipeline backend trait and HTTP implementation
//! - [`workflow`] - State machine and its async driver
//! - [`export`] - Saving documents and exporting the timeline
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface
//! - [`repl`] - Interactive session

pub mod cli;
pub mod config;
pub mod domain;
pub mod export;
pub mod gateway;
pub mod repl;
pub mod workflow;

// Re-export commonly used types
pub use config::{Config, OutputConfig, PipelineConfig, WorkflowConfig};
pub use domain::{ConversationLog, Plan, PlanEditor, Stage, TimelineEntry, sanitize};
pub use gateway::{
    Document, ErrorKind, ExecutionOutcome, ExecutionResult, GatewayError, HttpGateway, PipelineGateway, create_gateway,
};
pub use workflow::{
    Phase, RunFailure, RunState, RunStatus, Step, WorkflowController, WorkflowError, WorkflowEvent, WorkflowHandle,
    WorkflowState,
};
