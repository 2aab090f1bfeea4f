use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::engine::traversal::DrainOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    Reset,
    Visit,
    Match,
    Action,
    DrainEnd,
}

/// One line of the JSON-lines engine trace.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub generation: u64,
    pub kind: TraceKind,

    pub identity: Option<String>,
    pub category: Option<String>,
    pub success: Option<bool>,
    pub detail: Option<String>,
}

impl TraceEvent {
    pub fn now(generation: u64, kind: TraceKind) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default(),
            generation,
            kind,
            identity: None,
            category: None,
            success: None,
            detail: None,
        }
    }

    pub fn with_identity(mut self, identity: &str) -> Self {
        self.identity = Some(identity.to_string());
        self
    }

    pub fn with_category(mut self, category: impl std::fmt::Debug) -> Self {
        self.category = Some(format!("{:?}", category));
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }

    pub fn with_outcome(self, outcome: &DrainOutcome, visited: usize) -> Self {
        self.with_detail(format!("{:?} after {} nodes", outcome, visited))
    }
}
