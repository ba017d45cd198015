//! Plan domain type
//!
//! A Plan is the artifact the user reviews before the pipeline executes:
//! which research queries to run, what to focus the analysis on, and which
//! documents to produce.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Deliverables used when the user leaves the output file list empty
pub const DEFAULT_OUTPUT_FILES: [&str; 3] = ["pain_points.md", "roadmap.md", "strategy.md"];

/// The editable research plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Search queries, in the order the user sees them
    #[serde(default)]
    pub research_queries: Vec<String>,

    /// Free-text analysis topics
    #[serde(default)]
    pub analysis_focus: Vec<String>,

    /// Filenames of the documents to produce (1-3 once sanitized)
    #[serde(default)]
    pub output_files: Vec<String>,
}

impl Plan {
    /// Create a plan from its three parts
    pub fn new<Q, F, O>(research_queries: Q, analysis_focus: F, output_files: O) -> Self
    where
        Q: IntoIterator,
        Q::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        Self {
            research_queries: research_queries.into_iter().map(Into::into).collect(),
            analysis_focus: analysis_focus.into_iter().map(Into::into).collect(),
            output_files: output_files.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a plan that produces the default deliverables
    pub fn with_default_files<Q, F>(research_queries: Q, analysis_focus: F) -> Self
    where
        Q: IntoIterator,
        Q::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self::new(research_queries, analysis_focus, DEFAULT_OUTPUT_FILES)
    }

    /// Output filenames joined by newlines, as the execution call expects
    pub fn output_format(&self) -> String {
        debug!(file_count = %self.output_files.len(), "output_format: called");
        self.output_files.join("\n")
    }

    /// True when every list is empty
    pub fn is_empty(&self) -> bool {
        self.research_queries.is_empty() && self.analysis_focus.is_empty() && self.output_files.is_empty()
    }
}

/// Default deliverables as owned strings
pub fn default_output_files() -> Vec<String> {
    DEFAULT_OUTPUT_FILES.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_new() {
        let plan = Plan::new(["q1", "q2"], ["market size"], ["a.md"]);
        assert_eq!(plan.research_queries, vec!["q1", "q2"]);
        assert_eq!(plan.analysis_focus, vec!["market size"]);
        assert_eq!(plan.output_files, vec!["a.md"]);
    }

    #[test]
    fn test_with_default_files() {
        let plan = Plan::with_default_files(["q"], Vec::<String>::new());
        assert_eq!(plan.output_files, default_output_files());
    }

    #[test]
    fn test_output_format_joins_with_newlines() {
        let plan = Plan::new(Vec::<String>::new(), Vec::<String>::new(), ["a.md", "b.md"]);
        assert_eq!(plan.output_format(), "a.md\nb.md");
    }

    #[test]
    fn test_is_empty() {
        assert!(Plan::default().is_empty());
        assert!(!Plan::new(["q"], Vec::<String>::new(), Vec::<String>::new()).is_empty());
    }

    #[test]
    fn test_plan_serde_missing_fields_default() {
        let plan: Plan = serde_json::from_str(r#"{"research_queries": ["x"]}"#).unwrap();
        assert_eq!(plan.research_queries, vec!["x"]);
        assert!(plan.analysis_focus.is_empty());
        assert!(plan.output_files.is_empty());
    }
}
