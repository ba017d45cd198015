//! Plan editing surface
//!
//! Holds the user's working copy of a proposed plan. The proposed plan is
//! cloned in, never borrowed, so edits cannot leak back into workflow state.
//! Edits are not sanitized here; that happens once, at confirmation.

use thiserror::Error;
use tracing::debug;

use super::plan::Plan;

/// Focus topics the editing surface offers
pub const MAX_EDITABLE_FOCUS: usize = 3;

/// Errors from editing operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("No {list} entry #{index} (have {len})")]
    IndexOutOfRange {
        list: &'static str,
        index: usize,
        len: usize,
    },

    #[error("At most {max} analysis focus topics can be edited")]
    FocusLimit { max: usize },
}

/// Working copy of a plan under review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEditor {
    draft: Plan,
}

impl PlanEditor {
    /// Start editing a copy of `proposed`
    pub fn new(proposed: &Plan) -> Self {
        debug!("PlanEditor::new: called");
        Self {
            draft: proposed.clone(),
        }
    }

    /// Current working copy
    pub fn draft(&self) -> &Plan {
        &self.draft
    }

    /// Finish editing
    pub fn into_draft(self) -> Plan {
        self.draft
    }

    pub fn add_query(&mut self, text: impl Into<String>) {
        debug!("PlanEditor::add_query: called");
        self.draft.research_queries.push(text.into());
    }

    /// Replace query `index` (1-based, as shown to the user)
    pub fn set_query(&mut self, index: usize, text: impl Into<String>) -> Result<(), EditError> {
        debug!(%index, "PlanEditor::set_query: called");
        let slot = slot_mut(&mut self.draft.research_queries, "query", index)?;
        *slot = text.into();
        Ok(())
    }

    /// Remove query `index` (1-based)
    pub fn remove_query(&mut self, index: usize) -> Result<String, EditError> {
        debug!(%index, "PlanEditor::remove_query: called");
        remove_at(&mut self.draft.research_queries, "query", index)
    }

    pub fn add_focus(&mut self, text: impl Into<String>) -> Result<(), EditError> {
        debug!("PlanEditor::add_focus: called");
        if self.draft.analysis_focus.len() >= MAX_EDITABLE_FOCUS {
            debug!("PlanEditor::add_focus: limit reached");
            return Err(EditError::FocusLimit {
                max: MAX_EDITABLE_FOCUS,
            });
        }
        self.draft.analysis_focus.push(text.into());
        Ok(())
    }

    /// Replace focus topic `index` (1-based)
    pub fn set_focus(&mut self, index: usize, text: impl Into<String>) -> Result<(), EditError> {
        debug!(%index, "PlanEditor::set_focus: called");
        let slot = slot_mut(&mut self.draft.analysis_focus, "focus", index)?;
        *slot = text.into();
        Ok(())
    }

    /// Remove focus topic `index` (1-based)
    pub fn remove_focus(&mut self, index: usize) -> Result<String, EditError> {
        debug!(%index, "PlanEditor::remove_focus: called");
        remove_at(&mut self.draft.analysis_focus, "focus", index)
    }

    /// Replace the output files from a comma- or newline-separated block
    ///
    /// Entries are only split here; trimming and defaults are applied by
    /// sanitization.
    pub fn set_output_files_block(&mut self, block: &str) {
        debug!(block_len = %block.len(), "PlanEditor::set_output_files_block: called");
        self.draft.output_files = block.split(',').map(str::to_string).collect();
    }
}

fn slot_mut<'a>(items: &'a mut [String], list: &'static str, index: usize) -> Result<&'a mut String, EditError> {
    let len = items.len();
    index
        .checked_sub(1)
        .and_then(|i| items.get_mut(i))
        .ok_or(EditError::IndexOutOfRange { list, index, len })
}

fn remove_at(items: &mut Vec<String>, list: &'static str, index: usize) -> Result<String, EditError> {
    if index == 0 || index > items.len() {
        return Err(EditError::IndexOutOfRange {
            list,
            index,
            len: items.len(),
        });
    }
    Ok(items.remove(index - 1))
}
