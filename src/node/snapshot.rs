use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::node::node_model::{NodeHandle, UiNode};
use crate::service::event::RootProvider;

// ============================================================================
// Snapshot tree model
// ============================================================================

/// A static UI tree, loaded from JSON/YAML or built in code.
///
/// `accepts_*` flags decide what the corresponding action call returns.
/// A `null` entry in `children` is an absent child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default, rename = "class")]
    pub class_name: Option<String>,

    #[serde(default)]
    pub resource_id: Option<String>,

    #[serde(default)]
    pub content_description: Option<String>,

    #[serde(default)]
    pub hint_text: Option<String>,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub editable: bool,

    #[serde(default = "default_true")]
    pub accepts_focus: bool,

    #[serde(default = "default_true")]
    pub accepts_text: bool,

    #[serde(default = "default_true")]
    pub accepts_submit: bool,

    #[serde(default)]
    pub children: Vec<Option<NodeSpec>>,
}

fn default_true() -> bool {
    true
}

impl NodeSpec {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: Some(class_name.to_string()),
            resource_id: None,
            content_description: None,
            hint_text: None,
            text: None,
            editable: false,
            accepts_focus: true,
            accepts_text: true,
            accepts_submit: true,
            children: vec![],
        }
    }

    /// Editable text field, e.g. `NodeSpec::edit_text("search_box")`.
    pub fn edit_text(resource_id: &str) -> Self {
        Self::new("android.widget.EditText")
            .with_id(resource_id)
            .editable()
    }

    pub fn button(resource_id: &str) -> Self {
        Self::new("android.widget.Button").with_id(resource_id)
    }

    pub fn layout(resource_id: &str) -> Self {
        Self::new("android.widget.LinearLayout").with_id(resource_id)
    }

    pub fn with_id(mut self, resource_id: &str) -> Self {
        self.resource_id = Some(resource_id.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.content_description = Some(description.to_string());
        self
    }

    pub fn with_hint(mut self, hint: &str) -> Self {
        self.hint_text = Some(hint.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    pub fn rejecting_focus(mut self) -> Self {
        self.accepts_focus = false;
        self
    }

    pub fn rejecting_text(mut self) -> Self {
        self.accepts_text = false;
        self
    }

    pub fn rejecting_submit(mut self) -> Self {
        self.accepts_submit = false;
        self
    }

    pub fn with_child(mut self, child: NodeSpec) -> Self {
        self.children.push(Some(child));
        self
    }

    pub fn with_missing_child(mut self) -> Self {
        self.children.push(None);
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Load a tree file; the format follows the extension (`.json`, `.yaml`, `.yml`).
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Label used in journals: resource id, else class name.
    pub fn label(&self) -> String {
        self.resource_id
            .clone()
            .or_else(|| self.class_name.clone())
            .unwrap_or_else(|| "<anonymous>".to_string())
    }
}

// ============================================================================
// Journal
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ActionKind {
    Focus,
    SetText(String),
    Submit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRecord {
    pub node: String,
    pub action: ActionKind,
    pub accepted: bool,
}

/// Shared record of everything done to handles of one snapshot host.
#[derive(Debug, Default)]
pub struct Journal {
    acquired: AtomicUsize,
    released: AtomicUsize,
    actions: Mutex<Vec<ActionRecord>>,
}

impl Journal {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Handles acquired but not yet released.
    pub fn live(&self) -> usize {
        self.acquired().saturating_sub(self.released())
    }

    pub fn actions(&self) -> Vec<ActionRecord> {
        self.lock_actions().clone()
    }

    /// Labels of nodes whose text was set successfully, in order.
    pub fn texts_set(&self) -> Vec<(String, String)> {
        self.lock_actions()
            .iter()
            .filter_map(|r| match (&r.action, r.accepted) {
                (ActionKind::SetText(value), true) => Some((r.node.clone(), value.clone())),
                _ => None,
            })
            .collect()
    }

    fn record(&self, node: String, action: ActionKind, accepted: bool) -> bool {
        self.lock_actions().push(ActionRecord {
            node,
            action,
            accepted,
        });
        accepted
    }

    fn lock_actions(&self) -> MutexGuard<'_, Vec<ActionRecord>> {
        self.actions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// ============================================================================
// Snapshot node handle
// ============================================================================

/// `UiNode` over one position in a shared snapshot tree.
pub struct SnapshotNode {
    root: Arc<NodeSpec>,
    path: Vec<usize>,
    journal: Arc<Journal>,
}

impl SnapshotNode {
    fn acquire(root: Arc<NodeSpec>, path: Vec<usize>, journal: Arc<Journal>) -> NodeHandle {
        journal.acquired.fetch_add(1, Ordering::SeqCst);
        NodeHandle::new(SnapshotNode {
            root,
            path,
            journal,
        })
    }

    fn spec(&self) -> &NodeSpec {
        self.path.iter().fold(self.root.as_ref(), |node, &i| {
            node.children.get(i).and_then(Option::as_ref).unwrap_or(node)
        })
    }
}

impl UiNode for SnapshotNode {
    fn class_name(&self) -> Option<String> {
        self.spec().class_name.clone()
    }

    fn resource_id(&self) -> Option<String> {
        self.spec().resource_id.clone()
    }

    fn content_description(&self) -> Option<String> {
        self.spec().content_description.clone()
    }

    fn hint_text(&self) -> Option<String> {
        self.spec().hint_text.clone()
    }

    fn text(&self) -> Option<String> {
        self.spec().text.clone()
    }

    fn is_editable(&self) -> bool {
        self.spec().editable
    }

    fn child_count(&self) -> usize {
        self.spec().children.len()
    }

    fn child_at(&self, index: usize) -> Option<NodeHandle> {
        self.spec().children.get(index)?.as_ref()?;

        let mut path = self.path.clone();
        path.push(index);
        Some(SnapshotNode::acquire(
            Arc::clone(&self.root),
            path,
            Arc::clone(&self.journal),
        ))
    }

    fn request_focus(&self) -> bool {
        let spec = self.spec();
        self.journal
            .record(spec.label(), ActionKind::Focus, spec.accepts_focus)
    }

    fn set_text(&self, value: &str) -> bool {
        let spec = self.spec();
        self.journal.record(
            spec.label(),
            ActionKind::SetText(value.to_string()),
            spec.accepts_text,
        )
    }

    fn submit(&self) -> bool {
        let spec = self.spec();
        self.journal
            .record(spec.label(), ActionKind::Submit, spec.accepts_submit)
    }

    fn recycle(&mut self) {
        self.journal.released.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Snapshot host
// ============================================================================

/// Root provider over a swappable snapshot tree. `None` models "no active window".
#[derive(Default)]
pub struct SnapshotHost {
    tree: Mutex<Option<Arc<NodeSpec>>>,
    journal: Arc<Journal>,
}

impl SnapshotHost {
    pub fn new(tree: NodeSpec) -> Self {
        Self {
            tree: Mutex::new(Some(Arc::new(tree))),
            journal: Arc::new(Journal::default()),
        }
    }

    /// Host with no active window.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn set_tree(&self, tree: Option<NodeSpec>) {
        *self.lock_tree() = tree.map(Arc::new);
    }

    pub fn journal(&self) -> Arc<Journal> {
        Arc::clone(&self.journal)
    }

    pub fn root_handle(&self) -> Option<NodeHandle> {
        let root = self.lock_tree().clone()?;
        Some(SnapshotNode::acquire(root, vec![], Arc::clone(&self.journal)))
    }

    fn lock_tree(&self) -> MutexGuard<'_, Option<Arc<NodeSpec>>> {
        self.tree.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RootProvider for SnapshotHost {
    fn root_node(&self) -> Option<NodeHandle> {
        self.root_handle()
    }
}
