use serde::{Deserialize, Serialize};

use crate::node::node_model::NodeHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ScreenChanged,
    ContentChanged,
    Other,
}

/// Event record delivered by the host. `source` is released once the event is handled.
#[derive(Debug)]
pub struct AccessibilityEvent {
    pub kind: EventKind,
    pub source: Option<NodeHandle>,
}

impl AccessibilityEvent {
    pub fn new(kind: EventKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(mut self, source: NodeHandle) -> Self {
        self.source = Some(source);
        self
    }
}

/// Supplies the root of the active window, `None` when there is none.
pub trait RootProvider {
    fn root_node(&self) -> Option<NodeHandle>;
}

impl<F> RootProvider for F
where
    F: Fn() -> Option<NodeHandle>,
{
    fn root_node(&self) -> Option<NodeHandle> {
        self()
    }
}
