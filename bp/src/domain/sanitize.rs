//! Plan sanitization
//!
//! Normalizes a user-edited plan into the canonical form the execution
//! call accepts. Pure and total: any input produces a valid plan, and
//! sanitizing twice gives the same result as sanitizing once.

use std::collections::HashSet;

use tracing::debug;

use super::plan::{Plan, default_output_files};

/// Maximum research queries sent for execution
pub const MAX_RESEARCH_QUERIES: usize = 5;

/// Maximum deliverables per run
pub const MAX_OUTPUT_FILES: usize = 3;

/// Sanitize a draft plan
///
/// - research queries: trimmed, empties dropped, exact duplicates removed
///   (first occurrence wins), capped at [`MAX_RESEARCH_QUERIES`]
/// - analysis focus: trimmed, empties dropped; repeats and length are kept
/// - output files: each entry may be a newline-joined block and is split
///   into lines, trimmed, empties dropped, defaulted when nothing remains,
///   capped at [`MAX_OUTPUT_FILES`]
pub fn sanitize(draft: &Plan) -> Plan {
    debug!(
        queries = %draft.research_queries.len(),
        focus = %draft.analysis_focus.len(),
        files = %draft.output_files.len(),
        "sanitize: called"
    );

    Plan {
        research_queries: sanitize_queries(&draft.research_queries),
        analysis_focus: trimmed_non_empty(draft.analysis_focus.iter().map(String::as_str)),
        output_files: sanitize_output_files(&draft.output_files),
    }
}

impl Plan {
    /// Sanitized copy of this plan
    pub fn sanitized(&self) -> Plan {
        sanitize(self)
    }
}

fn sanitize_queries(queries: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(MAX_RESEARCH_QUERIES);

    for query in trimmed_non_empty(queries.iter().map(String::as_str)) {
        if out.len() == MAX_RESEARCH_QUERIES {
            debug!("sanitize_queries: cap reached, dropping the rest");
            break;
        }
        if seen.insert(query.clone()) {
            out.push(query);
        } else {
            debug!(%query, "sanitize_queries: dropping duplicate");
        }
    }

    out
}

fn sanitize_output_files(files: &[String]) -> Vec<String> {
    let mut out = trimmed_non_empty(files.iter().flat_map(|block| block.lines()));

    if out.is_empty() {
        debug!("sanitize_output_files: nothing left, using defaults");
        return default_output_files();
    }

    out.truncate(MAX_OUTPUT_FILES);
    out
}

fn trimmed_non_empty<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    items
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
