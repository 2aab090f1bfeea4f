use thiserror::Error;
use tracing::debug;

use crate::node::node_model::{HostCapabilities, UiNode};

/// Step of the search sequence that did not go through.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("node is not editable")]
    NotEditable,

    #[error("focus request rejected")]
    FocusRejected,

    #[error("set text rejected")]
    SetTextRejected,

    #[error("submit rejected")]
    SubmitRejected,

    #[error("host has no submit action")]
    SubmitUnsupported,
}

/// Runs focus → set text → submit against a single node.
///
/// No retries and no rollback: a step that fails leaves earlier steps applied.
#[derive(Debug, Clone)]
pub struct ActionExecutor {
    capabilities: HostCapabilities,
}

impl ActionExecutor {
    pub fn new(capabilities: HostCapabilities) -> Self {
        Self { capabilities }
    }

    pub fn try_search(&self, node: &dyn UiNode, query: &str) -> bool {
        match self.search(node, query) {
            Ok(()) => true,
            Err(e) => {
                debug!(resource_id = ?node.resource_id(), error = %e, "search action failed");
                false
            }
        }
    }

    pub fn search(&self, node: &dyn UiNode, query: &str) -> Result<(), ActionError> {
        if !node.is_editable() {
            return Err(ActionError::NotEditable);
        }
        if !node.request_focus() {
            return Err(ActionError::FocusRejected);
        }
        if !node.set_text(query) {
            return Err(ActionError::SetTextRejected);
        }
        if !self.capabilities.submit_action {
            return Err(ActionError::SubmitUnsupported);
        }
        if !node.submit() {
            return Err(ActionError::SubmitRejected);
        }
        Ok(())
    }
}
