//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Bizplan - business idea analysis with a human in the loop
#[derive(Parser)]
#[command(
    name = "bp",
    about = "Turn a business idea into a reviewed research plan and analysis documents",
    version,
    after_help = "Logs are written to: ~/.local/share/bizplan/logs/bizplan.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Start an interactive session
    Repl {
        /// Idea to submit right away
        idea: Option<String>,
    },

    /// Request a research plan for an idea and print it
    Plan {
        /// The business idea
        idea: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate, approve unchanged and execute a plan
    Run {
        /// The business idea
        idea: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Save produced documents to this directory
        #[arg(long, value_name = "DIR")]
        save: Option<PathBuf>,
    },

    /// Show logs
    Logs {
        /// Follow log output (like tail -f)
        #[arg(short, long)]
        follow: bool,

        /// Number of lines to show
        #[arg(short = 'n', long, default_value = "50")]
        lines: usize,
    },
}

/// Output format for plan/run results
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Path of the log file written by the binary
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bizplan")
        .join("logs")
        .join("bizplan.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_command() {
        let cli = Cli::parse_from(["bp"]);
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parse_repl() {
        let cli = Cli::parse_from(["bp", "repl"]);
        assert!(matches!(cli.command, Some(Command::Repl { idea: None })));

        let cli = Cli::parse_from(["bp", "repl", "coffee for offices"]);
        match cli.command {
            Some(Command::Repl { idea }) => assert_eq!(idea.as_deref(), Some("coffee for offices")),
            _ => panic!("Expected Repl command"),
        }
    }

    #[test]
    fn test_cli_parse_plan() {
        let cli = Cli::parse_from(["bp", "plan", "dog walking app", "-f", "json"]);
        match cli.command {
            Some(Command::Plan { idea, format }) => {
                assert_eq!(idea, "dog walking app");
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("Expected Plan command"),
        }
    }

    #[test]
    fn test_cli_parse_run_with_save() {
        let cli = Cli::parse_from(["bp", "run", "idea", "--save", "out"]);
        match cli.command {
            Some(Command::Run { idea, format, save }) => {
                assert_eq!(idea, "idea");
                assert_eq!(format, OutputFormat::Text);
                assert_eq!(save, Some(PathBuf::from("out")));
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_logs() {
        let cli = Cli::parse_from(["bp", "logs", "-f", "-n", "10"]);
        assert!(matches!(
            cli.command,
            Some(Command::Logs {
                follow: true,
                lines: 10
            })
        ));
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from(["bp", "plan", "idea", "-v", "-c", "custom.yml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("custom.yml")));
    }

    #[test]
    fn test_cli_plan_requires_idea() {
        assert!(Cli::try_parse_from(["bp", "plan"]).is_err());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("table".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }
}
