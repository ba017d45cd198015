//! Pipeline stages and progress lookup
//!
//! The backend does not push progress. What the user sees is derived
//! locally from the stage the workflow is in.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

/// A named point in the pipeline's progress
///
/// Ordering follows the normal flow; `Error` sorts last but is an abnormal
/// exit rather than a pipeline position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Stage {
    #[default]
    Init,
    Generate,
    Approval,
    Research,
    Analyze,
    Completed,
    Error,
}

/// Progress display for a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageProgress {
    /// 0..=100
    pub percent: u8,
    pub message: &'static str,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::Init,
        Stage::Generate,
        Stage::Approval,
        Stage::Research,
        Stage::Analyze,
        Stage::Completed,
        Stage::Error,
    ];

    /// Lowercase identifier
    pub fn name(self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Generate => "generate",
            Stage::Approval => "approval",
            Stage::Research => "research",
            Stage::Analyze => "analyze",
            Stage::Completed => "completed",
            Stage::Error => "error",
        }
    }

    /// Parse a stage identifier, falling back to `Init` for anything unknown
    pub fn from_name(name: &str) -> Stage {
        let normalized = name.trim().to_ascii_lowercase();
        match Stage::ALL.iter().find(|s| s.name() == normalized) {
            Some(stage) => *stage,
            None => {
                debug!(%name, "Stage::from_name: unknown stage, using init");
                Stage::Init
            }
        }
    }

    /// Percentage and default message for this stage
    pub fn progress(self) -> StageProgress {
        progress_for(self)
    }

    /// True for `Completed` and `Error`
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Completed | Stage::Error)
    }
}

/// Progress lookup for a stage
pub fn progress_for(stage: Stage) -> StageProgress {
    let (percent, message) = match stage {
        Stage::Init => (0, "Preparing..."),
        Stage::Generate => (25, "Generating a research plan..."),
        Stage::Approval => (40, "Waiting for plan approval"),
        Stage::Research => (60, "Researching the approved queries..."),
        Stage::Analyze => (80, "Analyzing findings and drafting documents..."),
        Stage::Completed => (100, "Analysis complete"),
        Stage::Error => (0, "An error occurred"),
    };
    StageProgress { percent, message }
}

/// Progress lookup by stage name; unknown names are treated as `init`
pub fn progress_for_name(name: &str) -> StageProgress {
    progress_for(Stage::from_name(name))
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for Stage {
    fn from(name: &str) -> Self {
        Stage::from_name(name)
    }
}

impl Serialize for Stage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Stage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Stage::from_name(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_table() {
        let expected = [
            (Stage::Init, 0),
            (Stage::Generate, 25),
            (Stage::Approval, 40),
            (Stage::Research, 60),
            (Stage::Analyze, 80),
            (Stage::Completed, 100),
            (Stage::Error, 0),
        ];
        for (stage, percent) in expected {
            assert_eq!(progress_for(stage).percent, percent, "stage {}", stage);
            assert!(!progress_for(stage).message.is_empty());
        }
    }

    #[test]
    fn test_normal_flow_is_strictly_monotonic() {
        let flow = &Stage::ALL[..6];
        for pair in flow.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].progress().percent < pair[1].progress().percent);
        }
    }

    #[test]
    fn test_error_resets_progress() {
        assert_eq!(Stage::Error.progress().percent, 0);
        assert!(Stage::Error > Stage::Completed);
    }

    #[test]
    fn test_from_name_roundtrips_every_stage() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_name(stage.name()), stage);
        }
        assert_eq!(Stage::from_name(" Research "), Stage::Research);
    }

    #[test]
    fn test_unknown_name_is_init() {
        assert_eq!(Stage::from_name("writing"), Stage::Init);
        assert_eq!(progress_for_name("nope"), progress_for(Stage::Init));
        assert_eq!(progress_for_name(""), progress_for(Stage::Init));
    }

    #[test]
    fn test_terminal_stages() {
        assert!(Stage::Completed.is_terminal());
        assert!(Stage::Error.is_terminal());
        assert!(!Stage::Approval.is_terminal());
    }

    #[test]
    fn test_serde_uses_names_and_is_lenient() {
        assert_eq!(serde_json::to_string(&Stage::Analyze).unwrap(), "\"analyze\"");
        let stage: Stage = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(stage, Stage::Completed);
        let stage: Stage = serde_json::from_str("\"mystery\"").unwrap();
        assert_eq!(stage, Stage::Init);
    }
}
