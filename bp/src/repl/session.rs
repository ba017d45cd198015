//! REPL session management

use std::path::{Path, PathBuf};

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info};

use super::command::{ListEdit, ReplCommand};
use crate::domain::{EditError, Plan, PlanEditor, Speaker, TimelineEntry, render_entry};
use crate::export::{export_filename, save_documents, write_timeline_jsonl};
use crate::workflow::{Phase, RunStatus, WorkflowHandle};

/// Interactive REPL session
pub struct ReplSession {
    workflow: WorkflowHandle,
    /// Working copy while a plan awaits approval
    editor: Option<PlanEditor>,
    output_dir: PathBuf,
    /// Timeline entries already printed
    shown: usize,
}

impl ReplSession {
    /// Create a new REPL session
    pub fn new(workflow: WorkflowHandle, output_dir: PathBuf) -> Self {
        Self {
            workflow,
            editor: None,
            output_dir,
            shown: 0,
        }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self, initial_idea: Option<String>) -> Result<()> {
        self.print_welcome();

        if let Some(idea) = initial_idea {
            println!("{} {}", ">".bright_green(), idea);
            self.submit_idea(&idea).await?;
        }

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let prompt = if self.editor.is_some() {
                format!("{} ", "plan>".bright_yellow())
            } else {
                format!("{} ", ">".bright_green())
            };

            match rl.readline(&prompt) {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(input);

                    if let SlashResult::Quit = self.handle_input(input).await? {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        self.workflow.shutdown().await.ok();
        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Bizplan Interactive Session".bright_cyan().bold());
        println!("Describe a business idea to get a research plan.");
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    async fn handle_input(&mut self, input: &str) -> Result<SlashResult> {
        debug!(%input, "handle_input: called");
        match ReplCommand::parse(input) {
            ReplCommand::Idea(text) => self.submit_idea(&text).await?,
            ReplCommand::Help => self.print_help(),
            ReplCommand::Quit => return Ok(SlashResult::Quit),
            ReplCommand::Status => print_status(&self.workflow.status()),
            ReplCommand::History => self.print_history().await?,
            ReplCommand::Save(dir) => {
                let dir = dir.unwrap_or_else(|| self.output_dir.clone());
                self.save(&dir).await?;
            }
            ReplCommand::Export(path) => self.export(&path).await?,
            ReplCommand::Plan => match &self.editor {
                Some(editor) => print_draft(editor.draft()),
                None => print_no_plan(),
            },
            ReplCommand::Query(edit) => self.edit(|editor| apply_query_edit(editor, edit)),
            ReplCommand::Focus(edit) => self.edit(|editor| apply_focus_edit(editor, edit)),
            ReplCommand::Files(block) => self.edit(|editor| {
                editor.set_output_files_block(&block);
                Ok(())
            }),
            ReplCommand::Confirm => self.confirm().await?,
            ReplCommand::Cancel => self.cancel().await?,
            ReplCommand::Usage(usage) => println!("{} {}", "Usage:".yellow(), usage),
            ReplCommand::Unknown(cmd) => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
            }
        }
        Ok(SlashResult::Continue)
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:22} Show this help", "/help".yellow());
        println!("  {:22} Exit the session", "/quit".yellow());
        println!("  {:22} Show progress and stage", "/status".yellow());
        println!("  {:22} Show the conversation so far", "/history".yellow());
        println!("  {:22} Save produced documents as Markdown", "/save [DIR]".yellow());
        println!("  {:22} Write the conversation as JSON lines", "/export PATH".yellow());
        println!();
        println!("{}", "While a plan awaits approval:".bright_cyan());
        println!("  {:22} Show the working copy", "/plan".yellow());
        println!("  {:22} Add, replace or remove a research query", "/query add|set N|rm N".yellow());
        println!("  {:22} Add, replace or remove an analysis focus", "/focus add|set N|rm N".yellow());
        println!("  {:22} Replace the output files", "/files a.md, b.md".yellow());
        println!("  {:22} Approve and run the plan", "/confirm".yellow());
        println!("  {:22} Discard the plan", "/cancel".yellow());
        println!();
    }

    async fn submit_idea(&mut self, text: &str) -> Result<()> {
        if self.editor.is_some() {
            println!(
                "{} A plan is awaiting approval. Use {} or {} first.",
                "!".yellow(),
                "/confirm".yellow(),
                "/cancel".yellow()
            );
            return Ok(());
        }

        if !self.workflow.submit(text).await? {
            let status = self.workflow.status();
            if status.is_busy {
                println!("{} Still working on the previous request.", "!".yellow());
            } else {
                println!("{} Nothing to submit.", "!".yellow());
            }
            return Ok(());
        }

        // The idea was echoed by the prompt
        self.shown += 1;
        let status = self.follow_progress().await?;

        if status.phase == Phase::AwaitingApproval {
            let run = self.workflow.run_state().await?;
            if let Some(proposed) = run.proposed_plan {
                let editor = PlanEditor::new(&proposed);
                println!();
                println!("{}", "Proposed plan".bright_cyan().bold());
                print_draft(editor.draft());
                println!(
                    "Edit with {} / {} / {}, then {} or {}.",
                    "/query".yellow(),
                    "/focus".yellow(),
                    "/files".yellow(),
                    "/confirm".yellow(),
                    "/cancel".yellow()
                );
                println!();
                self.editor = Some(editor);
            }
        }
        Ok(())
    }

    async fn confirm(&mut self) -> Result<()> {
        let Some(editor) = self.editor.take() else {
            print_no_plan();
            return Ok(());
        };

        let draft = editor.into_draft();
        info!(queries = draft.research_queries.len(), "Confirming plan");
        if !self.workflow.confirm(draft).await? {
            println!("{} The plan is no longer awaiting approval.", "!".yellow());
            return Ok(());
        }

        let status = self.follow_progress().await?;
        if status.phase != Phase::Done {
            return Ok(());
        }
        println!("{}", progress_line(&status).dimmed());
        if self.workflow.log_snapshot().await?.documents().next().is_some() {
            println!(
                "Use {} to write the documents to {}.",
                "/save".yellow(),
                self.output_dir.display()
            );
        }
        Ok(())
    }

    async fn cancel(&mut self) -> Result<()> {
        if self.editor.take().is_none() {
            print_no_plan();
            return Ok(());
        }
        self.workflow.cancel().await?;
        self.print_new_entries().await
    }

    /// Apply an edit to the working copy and show the result
    fn edit<F>(&mut self, apply: F)
    where
        F: FnOnce(&mut PlanEditor) -> Result<(), EditError>,
    {
        let Some(editor) = self.editor.as_mut() else {
            print_no_plan();
            return;
        };
        match apply(editor) {
            Ok(()) => print_draft(editor.draft()),
            Err(e) => println!("{} {}", "!".yellow(), e),
        }
    }

    /// Print progress until no call is outstanding, then the new entries
    async fn follow_progress(&mut self) -> Result<RunStatus> {
        let mut rx = self.workflow.subscribe();
        let mut last: Option<(u8, String)> = None;

        let status = loop {
            let status = rx.borrow_and_update().clone();
            let line = (status.percent, status.message.clone());
            if status.is_busy && last.as_ref() != Some(&line) {
                println!("{}", progress_line(&status).dimmed());
                last = Some(line);
            }
            if !status.is_busy {
                break status;
            }
            if rx.changed().await.is_err() {
                return Err(eyre::eyre!("Workflow stopped unexpectedly"));
            }
        };

        self.print_new_entries().await?;
        Ok(status)
    }

    async fn print_new_entries(&mut self) -> Result<()> {
        let entries = self.workflow.timeline_since(self.shown).await?;
        self.shown += entries.len();
        for entry in &entries {
            print_entry(entry);
        }
        Ok(())
    }

    async fn print_history(&self) -> Result<()> {
        let entries = self.workflow.timeline().await?;
        if entries.is_empty() {
            println!("{}", "No conversation history.".dimmed());
            return Ok(());
        }

        println!();
        println!("{}", "Conversation History:".bright_cyan());
        for entry in &entries {
            print_entry(entry);
        }
        Ok(())
    }

    async fn save(&self, dir: &Path) -> Result<()> {
        let log = self.workflow.log_snapshot().await?;
        let paths = save_documents(&log, dir)?;
        if paths.is_empty() {
            println!("{}", "No documents to save yet.".dimmed());
            return Ok(());
        }
        for path in &paths {
            println!("{} {}", "Saved".bright_green(), path.display());
        }
        Ok(())
    }

    async fn export(&self, path: &Path) -> Result<()> {
        let log = self.workflow.log_snapshot().await?;
        write_timeline_jsonl(&log, path)?;
        println!("{} {} ({} entries)", "Exported".bright_green(), path.display(), log.len());
        Ok(())
    }
}

fn apply_query_edit(editor: &mut PlanEditor, edit: ListEdit) -> Result<(), EditError> {
    match edit {
        ListEdit::Add(text) => {
            editor.add_query(text);
            Ok(())
        }
        ListEdit::Set(index, text) => editor.set_query(index, text),
        ListEdit::Remove(index) => editor.remove_query(index).map(|_| ()),
    }
}

fn apply_focus_edit(editor: &mut PlanEditor, edit: ListEdit) -> Result<(), EditError> {
    match edit {
        ListEdit::Add(text) => editor.add_focus(text),
        ListEdit::Set(index, text) => editor.set_focus(index, text),
        ListEdit::Remove(index) => editor.remove_focus(index).map(|_| ()),
    }
}

fn print_no_plan() {
    println!("{}", "No plan is awaiting approval.".dimmed());
}

fn progress_line(status: &RunStatus) -> String {
    format!("[{:>3}%] {}", status.percent, status.message)
}

fn print_status(status: &RunStatus) {
    println!(
        "{} {}  {} {}  {}",
        "phase:".dimmed(),
        status.phase,
        "stage:".dimmed(),
        status.stage,
        progress_line(status)
    );
}

/// Numbered view of the working copy
fn print_draft(plan: &Plan) {
    println!("{}", "Research queries".bold());
    print_numbered(&plan.research_queries);
    println!("{}", "Analysis focus".bold());
    print_numbered(&plan.analysis_focus);
    println!("{}", "Output files".bold());
    if plan.output_files.is_empty() {
        println!("  {}", "(defaults)".dimmed());
    }
    for file in &plan.output_files {
        println!("  - {}  {}", file, format!("-> {}", export_filename(file, "pdf")).dimmed());
    }
}

fn print_numbered(items: &[String]) {
    if items.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for (i, item) in items.iter().enumerate() {
        println!("  {}. {}", i + 1, item);
    }
}

fn print_entry(entry: &TimelineEntry) {
    let rendered = render_entry(entry);
    let speaker = match rendered.speaker {
        Speaker::User => "you".bright_green(),
        Speaker::Agent => "bizplan".bright_blue(),
        Speaker::System => "system".yellow(),
    };
    match &rendered.title {
        Some(title) => println!("{} {}", speaker, title.bold()),
        None => println!("{}", speaker),
    }
    println!("{}", rendered.body);
    println!();
}

/// Result of handling a slash command
enum SlashResult {
    Continue,
    Quit,
}
