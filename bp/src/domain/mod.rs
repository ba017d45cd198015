//! Domain types for the analysis workflow
//!
//! Plans, their sanitization and editing, pipeline stages, and the
//! conversation timeline. Everything here is pure data and pure functions.

mod editor;
mod plan;
mod sanitize;
mod stage;
mod timeline;

pub use editor::{EditError, MAX_EDITABLE_FOCUS, PlanEditor};
pub use plan::{DEFAULT_OUTPUT_FILES, Plan, default_output_files};
pub use sanitize::{MAX_OUTPUT_FILES, MAX_RESEARCH_QUERIES, sanitize};
pub use stage::{Stage, StageProgress, progress_for, progress_for_name};
pub use timeline::{
    ConversationLog, RenderedEntry, Speaker, TimelineEntry, TimelineRecord, plan_markdown, render_entry,
};
