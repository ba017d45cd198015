//! Conversation timeline
//!
//! An append-only record of everything the user and the pipeline said
//! during the session. Entries are never mutated or removed once appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::plan::Plan;

/// One item in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum TimelineEntry {
    /// The user submitted an idea
    UserText { text: String },
    /// Plain text from the pipeline (results or failure reports)
    AgentText { text: String },
    /// A Markdown document produced by the pipeline
    AgentDocument { filename: String, content: String },
    /// Workflow notices such as cancellation
    SystemNotice { text: String },
    /// Copy of the plan the user approved
    PlanSnapshot { plan: Plan },
}

impl TimelineEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self::UserText { text: text.into() }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self::AgentText { text: text.into() }
    }

    pub fn document(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self::AgentDocument {
            filename: filename.into(),
            content: content.into(),
        }
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Self::SystemNotice { text: text.into() }
    }

    pub fn snapshot(plan: Plan) -> Self {
        Self::PlanSnapshot { plan }
    }

    /// Text body for the text-carrying variants
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::UserText { text } | Self::AgentText { text } | Self::SystemNotice { text } => Some(text),
            Self::AgentDocument { content, .. } => Some(content),
            Self::PlanSnapshot { .. } => None,
        }
    }

    /// Short variant name, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserText { .. } => "user_text",
            Self::AgentText { .. } => "agent_text",
            Self::AgentDocument { .. } => "agent_document",
            Self::SystemNotice { .. } => "system_notice",
            Self::PlanSnapshot { .. } => "plan_snapshot",
        }
    }
}

/// An appended entry with the time it was recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineRecord {
    pub timestamp: DateTime<Utc>,
    pub entry: TimelineEntry,
}

/// Who an entry is shown as coming from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Agent,
    System,
}

/// Display-ready projection of an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEntry {
    pub speaker: Speaker,
    /// Optional heading (document filename, snapshot label)
    pub title: Option<String>,
    /// Markdown body
    pub body: String,
}

/// Append-only, insertion-ordered sequence of timeline entries
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    records: Vec<TimelineRecord>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry at the end of the timeline
    pub fn append(&mut self, entry: TimelineEntry) {
        debug!(kind = entry.kind(), index = self.records.len(), "append: called");
        self.records.push(TimelineRecord {
            timestamp: Utc::now(),
            entry,
        });
    }

    /// Every entry in insertion order
    ///
    /// The iterator is cheap to clone and the method can be called any
    /// number of times.
    pub fn all(&self) -> impl Iterator<Item = &TimelineEntry> + Clone + '_ {
        self.records.iter().map(|r| &r.entry)
    }

    /// Entries appended at or after `index`
    pub fn since(&self, index: usize) -> impl Iterator<Item = &TimelineEntry> + Clone + '_ {
        self.records.iter().skip(index).map(|r| &r.entry)
    }

    /// Entries with their timestamps
    pub fn records(&self) -> &[TimelineRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Last appended entry
    pub fn last(&self) -> Option<&TimelineEntry> {
        self.records.last().map(|r| &r.entry)
    }

    /// (filename, content) of every document entry
    pub fn documents(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.all().filter_map(|entry| match entry {
            TimelineEntry::AgentDocument { filename, content } => Some((filename.as_str(), content.as_str())),
            _ => None,
        })
    }

    /// Display projection of the whole timeline
    pub fn render(&self) -> Vec<RenderedEntry> {
        self.all().map(render_entry).collect()
    }
}

/// Display projection of one entry
pub fn render_entry(entry: &TimelineEntry) -> RenderedEntry {
    match entry {
        TimelineEntry::UserText { text } => RenderedEntry {
            speaker: Speaker::User,
            title: None,
            body: text.clone(),
        },
        TimelineEntry::AgentText { text } => RenderedEntry {
            speaker: Speaker::Agent,
            title: None,
            body: text.clone(),
        },
        TimelineEntry::AgentDocument { filename, content } => RenderedEntry {
            speaker: Speaker::Agent,
            title: Some(filename.clone()),
            body: content.clone(),
        },
        TimelineEntry::SystemNotice { text } => RenderedEntry {
            speaker: Speaker::System,
            title: None,
            body: text.clone(),
        },
        TimelineEntry::PlanSnapshot { plan } => RenderedEntry {
            speaker: Speaker::User,
            title: Some("Approved plan".to_string()),
            body: plan_markdown(plan),
        },
    }
}

/// Read-only Markdown rendering of a plan
pub fn plan_markdown(plan: &Plan) -> String {
    let mut out = String::new();
    push_section(&mut out, "Research queries", &plan.research_queries, true);
    push_section(&mut out, "Analysis focus", &plan.analysis_focus, false);
    push_section(&mut out, "Output files", &plan.output_files, false);
    out.trim_end().to_string()
}

fn push_section(out: &mut String, heading: &str, items: &[String], numbered: bool) {
    out.push_str(&format!("**{}**\n", heading));
    if items.is_empty() {
        out.push_str("- (none)\n");
    }
    for (i, item) in items.iter().enumerate() {
        if numbered {
            out.push_str(&format!("{}. {}\n", i + 1, item));
        } else {
            out.push_str(&format!("- {}\n", item));
        }
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_log() -> ConversationLog {
        let mut log = ConversationLog::new();
        log.append(TimelineEntry::user("coffee subscription for offices"));
        log.append(TimelineEntry::snapshot(Plan::with_default_files(["office coffee market"], ["pricing"])));
        log.append(TimelineEntry::document("roadmap.md", "# Roadmap"));
        log.append(TimelineEntry::agent("done"));
        log
    }

    #[test]
    fn test_append_preserves_order() {
        let log = sample_log();
        let kinds: Vec<_> = log.all().map(TimelineEntry::kind).collect();
        assert_eq!(kinds, vec!["user_text", "plan_snapshot", "agent_document", "agent_text"]);
        assert_eq!(log.len(), 4);
        assert!(!log.is_empty());
    }

    #[test]
    fn test_all_is_restartable() {
        let log = sample_log();
        let iter = log.all();
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
        assert_eq!(log.all().count(), log.all().count());
    }

    #[test]
    fn test_since() {
        let log = sample_log();
        let tail: Vec<_> = log.since(2).map(TimelineEntry::kind).collect();
        assert_eq!(tail, vec!["agent_document", "agent_text"]);
        assert_eq!(log.since(10).count(), 0);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut plan = Plan::with_default_files(["q1"], ["f1"]);
        let mut log = ConversationLog::new();
        log.append(TimelineEntry::snapshot(plan.clone()));

        plan.research_queries.push("q2".to_string());

        match log.last() {
            Some(TimelineEntry::PlanSnapshot { plan: stored }) => assert_eq!(stored.research_queries, vec!["q1"]),
            other => panic!("unexpected entry: {:?}", other),
        }
    }

    #[test]
    fn test_documents() {
        let log = sample_log();
        let docs: Vec<_> = log.documents().collect();
        assert_eq!(docs, vec![("roadmap.md", "# Roadmap")]);
    }

    #[test]
    fn test_render_projection() {
        let rendered = sample_log().render();
        assert_eq!(rendered[0].speaker, Speaker::User);
        assert_eq!(rendered[1].title.as_deref(), Some("Approved plan"));
        assert!(rendered[1].body.contains("1. office coffee market"));
        assert!(rendered[1].body.contains("- pricing"));
        assert_eq!(rendered[2].title.as_deref(), Some("roadmap.md"));
        assert_eq!(rendered[3].speaker, Speaker::Agent);
    }

    #[test]
    fn test_plan_markdown_empty_sections() {
        let md = plan_markdown(&Plan::default());
        assert!(md.contains("**Research queries**\n- (none)"));
    }

    #[test]
    fn test_record_serialization() {
        let log = sample_log();
        let json = serde_json::to_string(&log.records()[2]).unwrap();
        assert!(json.contains("\"type\":\"AgentDocument\""));
        assert!(json.contains("roadmap.md"));
        assert!(json.contains("timestamp"));

        let back: TimelineRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entry, log.records()[2].entry);
    }

    #[test]
    fn test_entry_text() {
        assert_eq!(TimelineEntry::notice("x").text(), Some("x"));
        assert_eq!(TimelineEntry::snapshot(Plan::default()).text(), None);
    }
}
