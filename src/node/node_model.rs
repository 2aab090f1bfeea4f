use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

// ============================================================================
// Host node handle
// ============================================================================

/// One UI element as exposed by the accessibility host.
///
/// Every attribute may be absent; callers treat absence as an empty string
/// or `false`. Children are fetched on demand and each child is an
/// independent handle with its own lifetime.
pub trait UiNode: Send {
    fn class_name(&self) -> Option<String>;
    fn resource_id(&self) -> Option<String>;
    fn content_description(&self) -> Option<String>;

    /// Only meaningful when the host exposes hint text (see `HostCapabilities`).
    fn hint_text(&self) -> Option<String>;

    fn text(&self) -> Option<String>;
    fn is_editable(&self) -> bool;

    fn child_count(&self) -> usize;
    fn child_at(&self, index: usize) -> Option<NodeHandle>;

    fn request_focus(&self) -> bool;
    fn set_text(&self, value: &str) -> bool;

    /// The "enter"/"go" action. Only invoked when the host supports it.
    fn submit(&self) -> bool;

    /// Returns the underlying host resource. Called exactly once, when the
    /// owning `NodeHandle` is dropped.
    fn recycle(&mut self) {}
}

/// Owned, single-use handle to a host node.
///
/// Handles move into the work queue and out again; dropping one is the
/// single release point.
pub struct NodeHandle(Box<dyn UiNode>);

impl NodeHandle {
    pub fn new(node: impl UiNode + 'static) -> Self {
        NodeHandle(Box::new(node))
    }

    /// Release the handle. Equivalent to dropping it.
    pub fn release(self) {}
}

impl Deref for NodeHandle {
    type Target = dyn UiNode;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl Drop for NodeHandle {
    fn drop(&mut self) {
        self.0.recycle();
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("class_name", &self.class_name())
            .field("resource_id", &self.resource_id())
            .finish()
    }
}

/// Absent attribute → empty string.
pub fn or_empty(value: Option<String>) -> String {
    value.unwrap_or_default()
}

// ============================================================================
// Node category
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeCategory {
    EditText,
    Button,
    Other,
}

impl NodeCategory {
    /// Classify by simple class name, e.g. `android.widget.EditText` → `EditText`.
    pub fn from_class_name(class_name: Option<&str>) -> Self {
        let simple = class_name
            .map(|c| c.rsplit('.').next().unwrap_or(c))
            .unwrap_or("");

        match simple {
            "EditText" => NodeCategory::EditText,
            "Button" => NodeCategory::Button,
            _ => NodeCategory::Other,
        }
    }

    pub fn of(node: &dyn UiNode) -> Self {
        Self::from_class_name(node.class_name().as_deref())
    }
}

// ============================================================================
// Host capabilities
// ============================================================================

/// First host API level exposing hint text on nodes.
pub const HINT_TEXT_API_LEVEL: u32 = 26;

/// First host API level supporting the submit ("enter") action.
pub const SUBMIT_ACTION_API_LEVEL: u32 = 30;

pub const DEFAULT_API_LEVEL: u32 = 30;

/// Version-gated host features, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCapabilities {
    pub hint_text: bool,
    pub submit_action: bool,
}

impl HostCapabilities {
    pub fn for_api_level(level: u32) -> Self {
        Self {
            hint_text: level >= HINT_TEXT_API_LEVEL,
            submit_action: level >= SUBMIT_ACTION_API_LEVEL,
        }
    }
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::for_api_level(DEFAULT_API_LEVEL)
    }
}
