//! Bizplan - human-in-the-loop business idea analysis
//!
//! CLI entry point for interactive sessions and one-shot plan/run commands.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use colored::Colorize;
use eyre::{Context, Result};
use serde::Serialize;
use tracing::info;

use bizplan::cli::{Cli, Command, OutputFormat, get_log_path};
use bizplan::config::Config;
use bizplan::domain::{Plan, TimelineEntry, plan_markdown, render_entry};
use bizplan::export::save_documents;
use bizplan::gateway::create_gateway;
use bizplan::workflow::{Phase, RunStatus, WorkflowHandle};

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Setup tracing subscriber - write to log file, not stdout/stderr
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs only need the log file; don't truncate it by setting up logging
    if let Some(Command::Logs { follow, lines }) = cli.command {
        return cmd_logs(follow, lines);
    }

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        "Bizplan loaded config: base_url={}, output_dir={}",
        config.pipeline.base_url,
        config.output.dir.display()
    );

    match cli.command {
        Some(Command::Repl { idea }) => bizplan::repl::run_interactive(&config, idea).await,
        Some(Command::Plan { idea, format }) => cmd_plan(&config, &idea, format).await,
        Some(Command::Run { idea, format, save }) => cmd_run(&config, &idea, format, save.as_deref()).await,
        Some(Command::Logs { .. }) => Ok(()),
        None => {
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

fn spawn_workflow(config: &Config) -> Result<WorkflowHandle> {
    let gateway =
        create_gateway(&config.pipeline).map_err(|e| eyre::eyre!("Failed to create pipeline client: {}", e))?;
    Ok(WorkflowHandle::spawn(gateway, config.workflow.clone()))
}

/// Wait for the outstanding call, echoing progress to stderr in text mode
async fn settle(workflow: &WorkflowHandle, format: &OutputFormat) -> Result<RunStatus> {
    if *format != OutputFormat::Text {
        return Ok(workflow.wait_until_settled().await?);
    }

    let mut rx = workflow.subscribe();
    let mut last_percent = None;
    loop {
        let status = rx.borrow_and_update().clone();
        if status.is_busy && last_percent != Some(status.percent) {
            eprintln!("{}", format!("[{:>3}%] {}", status.percent, status.message).dimmed());
            last_percent = Some(status.percent);
        }
        if !status.is_busy {
            return Ok(status);
        }
        rx.changed().await.context("Workflow stopped unexpectedly")?;
    }
}

/// Submit an idea and return the proposed plan
async fn propose(workflow: &WorkflowHandle, idea: &str, format: &OutputFormat) -> Result<Plan> {
    if !workflow.submit(idea).await? {
        return Err(eyre::eyre!("Idea must not be empty"));
    }

    let status = settle(workflow, format).await?;
    let run = workflow.run_state().await?;
    if let Some(failure) = run.last_error {
        return Err(eyre::eyre!("{}", failure));
    }
    run.proposed_plan
        .ok_or_else(|| eyre::eyre!("No plan was proposed (workflow is {})", status.phase))
}

/// Request a plan and print it
async fn cmd_plan(config: &Config, idea: &str, format: OutputFormat) -> Result<()> {
    let workflow = spawn_workflow(config)?;
    let plan = propose(&workflow, idea, &format).await?;

    match format {
        OutputFormat::Text => println!("{}", plan_markdown(&plan)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }

    workflow.shutdown().await.ok();
    Ok(())
}

/// Everything a non-interactive run produced
#[derive(Serialize)]
struct RunReport {
    idea: String,
    plan: Option<Plan>,
    status: RunStatus,
    entries: Vec<TimelineEntry>,
    saved: Vec<PathBuf>,
}

/// Generate a plan, approve it unchanged and execute it
async fn cmd_run(config: &Config, idea: &str, format: OutputFormat, save: Option<&Path>) -> Result<()> {
    let workflow = spawn_workflow(config)?;
    let proposed = propose(&workflow, idea, &format).await?;

    if !workflow.confirm(proposed).await? {
        return Err(eyre::eyre!("Plan was not accepted for execution"));
    }
    let status = settle(&workflow, &format).await?;

    let run = workflow.run_state().await?;
    let log = workflow.log_snapshot().await?;
    // Everything after the approved plan snapshot belongs to the result
    let entries: Vec<TimelineEntry> = log
        .all()
        .skip_while(|e| !matches!(e, TimelineEntry::PlanSnapshot { .. }))
        .cloned()
        .collect();

    let saved = match save {
        Some(dir) if status.phase == Phase::Done => save_documents(&log, dir)?,
        _ => Vec::new(),
    };

    match format {
        OutputFormat::Text => {
            for entry in &entries {
                let rendered = render_entry(entry);
                if let Some(title) = &rendered.title {
                    println!("{}", format!("== {} ==", title).bold());
                }
                println!("{}", rendered.body);
                println!();
            }
            for path in &saved {
                eprintln!("{} {}", "Saved".green(), path.display());
            }
        }
        OutputFormat::Json => {
            let report = RunReport {
                idea: idea.to_string(),
                plan: run.approved_plan.clone(),
                status: status.clone(),
                entries,
                saved,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    workflow.shutdown().await.ok();

    match run.last_error {
        Some(failure) => Err(eyre::eyre!("{}", failure)),
        None => Ok(()),
    }
}

/// Show logs
fn cmd_logs(follow: bool, lines: usize) -> Result<()> {
    let log_path = get_log_path();

    if !log_path.exists() {
        println!("No log file found at: {}", log_path.display());
        return Ok(());
    }

    if follow {
        println!("Following log file: {} (Ctrl+C to stop)", log_path.display());
        println!();

        // Use tail -f for following
        let mut child = std::process::Command::new("tail")
            .args(["-f", "-n", &lines.to_string()])
            .arg(&log_path)
            .spawn()
            .context("Failed to run tail -f")?;

        child.wait()?;
    } else {
        // Read last N lines
        let file = fs::File::open(&log_path).context("Failed to open log file")?;
        let reader = BufReader::new(file);
        let all_lines: Vec<String> = reader.lines().map_while(Result::ok).collect();

        let start = all_lines.len().saturating_sub(lines);
        for line in &all_lines[start..] {
            println!("{}", line);
        }
    }

    Ok(())
}
