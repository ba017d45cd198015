//! Bizplan configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pipeline backend endpoints
    pub pipeline: PipelineConfig,

    /// Workflow pacing
    pub workflow: WorkflowConfig,

    /// Where finished documents are saved
    pub output: OutputConfig,
}

impl Config {
    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        let base = self.pipeline.base_url.trim();
        if base.is_empty() {
            return Err(eyre::eyre!("pipeline.base-url must not be empty"));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(eyre::eyre!(
                "pipeline.base-url must start with http:// or https:// (got '{}')",
                base
            ));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .bizplan.yml
        let local_config = PathBuf::from(".bizplan.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/bizplan/bizplan.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("bizplan").join("bizplan.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Pipeline backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Backend base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the plan generation endpoint
    #[serde(rename = "plan-path")]
    pub plan_path: String,

    /// Path of the plan execution endpoint
    #[serde(rename = "execute-path")]
    pub execute_path: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5001".to_string(),
            plan_path: "/generate-plan".to_string(),
            execute_path: "/execute-plan".to_string(),
            // Execution runs web research and document writing server-side
            timeout_ms: 600_000,
        }
    }
}

impl PipelineConfig {
    pub fn plan_url(&self) -> String {
        join_url(&self.base_url, &self.plan_path)
    }

    pub fn execute_url(&self) -> String {
        join_url(&self.base_url, &self.execute_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Workflow pacing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Pause before surfacing a finished result, in milliseconds (0 disables)
    #[serde(rename = "result-delay-ms")]
    pub result_delay_ms: u64,

    /// Interval of simulated progress while a plan executes, in milliseconds
    #[serde(rename = "progress-tick-ms")]
    pub progress_tick_ms: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            result_delay_ms: 800,
            progress_tick_ms: 4000,
        }
    }
}

impl WorkflowConfig {
    /// Pacing suitable for tests and scripts
    pub fn immediate() -> Self {
        Self {
            result_delay_ms: 0,
            progress_tick_ms: 50,
        }
    }

    pub fn result_delay(&self) -> Duration {
        Duration::from_millis(self.result_delay_ms)
    }

    /// Tick interval, never zero
    pub fn progress_tick(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms.max(1))
    }
}

/// Document output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for saved documents
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
        }
    }
}
