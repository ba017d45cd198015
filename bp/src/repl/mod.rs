//! Interactive REPL for Bizplan
//!
//! Submit an idea, review and edit the proposed plan, approve it, and
//! read or save the resulting documents.

mod command;
mod session;

pub use command::{ListEdit, ReplCommand};
pub use session::ReplSession;

use eyre::Result;

use crate::config::Config;
use crate::gateway::create_gateway;
use crate::workflow::WorkflowHandle;

/// Run the interactive REPL
///
/// This is the main entry point for `bp repl`.
pub async fn run_interactive(config: &Config, initial_idea: Option<String>) -> Result<()> {
    let gateway =
        create_gateway(&config.pipeline).map_err(|e| eyre::eyre!("Failed to create pipeline client: {}", e))?;
    let workflow = WorkflowHandle::spawn(gateway, config.workflow.clone());

    let mut session = ReplSession::new(workflow, config.output.dir.clone());
    session.run(initial_idea).await
}
