//! Saving finished documents and exporting the timeline

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use tracing::{debug, info};

use crate::domain::ConversationLog;

/// Filename used when a document name has no usable characters
const FALLBACK_STEM: &str = "document";

/// Derive a filesystem-safe filename with the given extension
///
/// Whitespace and anything other than ASCII letters, digits, `-`, `_` and
/// `.` become `_`. An existing extension is replaced.
pub fn export_filename(name: &str, extension: &str) -> String {
    let name = name.trim();
    let stem = match name.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => stem,
        _ => name,
    };

    let mut safe: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.trim_matches(|c| c == '_' || c == '.').is_empty() {
        safe = FALLBACK_STEM.to_string();
    }

    let extension = extension.trim().trim_start_matches('.');
    if extension.is_empty() {
        safe
    } else {
        format!("{}.{}", safe, extension)
    }
}

/// Write every document in the log to `dir` as Markdown
///
/// Creates `dir` if needed. A later document with the same derived name
/// overwrites an earlier one. Returns the written paths in timeline order.
pub fn save_documents(log: &ConversationLog, dir: &Path) -> Result<Vec<PathBuf>> {
    debug!(dir = %dir.display(), "save_documents: called");
    fs::create_dir_all(dir).context(format!("Failed to create {}", dir.display()))?;

    let mut written = Vec::new();
    for (filename, content) in log.documents() {
        let path = dir.join(export_filename(filename, "md"));
        fs::write(&path, content).context(format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), bytes = content.len(), "save_documents: wrote document");
        written.push(path);
    }

    info!(count = written.len(), dir = %dir.display(), "Saved documents");
    Ok(written)
}

/// Write the timeline as JSON lines, one record per entry
pub fn write_timeline_jsonl(log: &ConversationLog, path: &Path) -> Result<()> {
    debug!(path = %path.display(), "write_timeline_jsonl: called");
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context(format!("Failed to create {}", parent.display()))?;
    }

    let file = File::create(path).context(format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for record in log.records() {
        let json = serde_json::to_string(record).context("Failed to serialize timeline entry")?;
        writeln!(writer, "{}", json)?;
    }
    writer.flush()?;

    info!(entries = log.len(), path = %path.display(), "Exported timeline");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Plan, TimelineEntry, TimelineRecord};

    #[test]
    fn test_export_filename_replaces_extension() {
        assert_eq!(export_filename("roadmap.md", "pdf"), "roadmap.pdf");
        assert_eq!(export_filename("pain_points.md", "md"), "pain_points.md");
        assert_eq!(export_filename("strategy", "md"), "strategy.md");
    }

    #[test]
    fn test_export_filename_normalizes_characters() {
        assert_eq!(export_filename("Go to market plan.md", "pdf"), "Go_to_market_plan.pdf");
        assert_eq!(export_filename("../etc/passwd", "md"), ".._etc_passwd.md");
        assert_eq!(export_filename("café menu.md", "md"), "caf__menu.md");
        assert_eq!(export_filename("v1.2-draft.txt", "md"), "v1.2-draft.md");
    }

    #[test]
    fn test_export_filename_fallbacks() {
        assert_eq!(export_filename("", "md"), "document.md");
        assert_eq!(export_filename("   ", "pdf"), "document.pdf");
        assert_eq!(export_filename(".md", ".md"), "document.md");
        assert_eq!(export_filename("notes", ""), "notes");
    }

    fn log_with_documents() -> ConversationLog {
        let mut log = ConversationLog::new();
        log.append(TimelineEntry::user("office coffee"));
        log.append(TimelineEntry::snapshot(Plan::with_default_files(["market"], ["pricing"])));
        log.append(TimelineEntry::document("pain_points.md", "# Pain points"));
        log.append(TimelineEntry::document("Go to market.md", "# GTM"));
        log
    }

    #[test]
    fn test_save_documents_writes_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");

        let paths = save_documents(&log_with_documents(), &out).unwrap();

        assert_eq!(paths, vec![out.join("pain_points.md"), out.join("Go_to_market.md")]);
        assert_eq!(fs::read_to_string(&paths[0]).unwrap(), "# Pain points");
        assert_eq!(fs::read_to_string(&paths[1]).unwrap(), "# GTM");
    }

    #[test]
    fn test_save_documents_without_documents() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = ConversationLog::new();
        log.append(TimelineEntry::agent("plain text result"));

        let paths = save_documents(&log, dir.path()).unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_write_timeline_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exports").join("session.jsonl");
        let log = log_with_documents();

        write_timeline_jsonl(&log, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let records: Vec<TimelineRecord> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].entry, TimelineEntry::user("office coffee"));
        assert_eq!(records[3].entry, TimelineEntry::document("Go to market.md", "# GTM"));
        assert!(content.lines().next().unwrap().contains("\"type\":\"UserText\""));
    }
}
