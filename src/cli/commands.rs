use std::collections::VecDeque;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::identity::identity;
use crate::engine::matcher::is_target;
use crate::engine::traversal::EngineSnapshot;
use crate::error::Result;
use crate::node::node_model::{HostCapabilities, NodeCategory, or_empty};
use crate::node::snapshot::{ActionKind, ActionRecord, NodeSpec, SnapshotHost};
use crate::service::event::{AccessibilityEvent, EventKind};
use crate::service::lifecycle::{SearchService, ServiceConfig};

// ============================================================================
// inspect subcommand
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct InspectRow {
    pub depth: usize,
    pub resource_id: String,
    pub class_name: String,
    pub identity: String,
    pub category: NodeCategory,
    pub target: bool,
}

/// Every node reachable from the host root, breadth-first.
pub fn inspect_tree(host: &SnapshotHost, capabilities: &HostCapabilities) -> Vec<InspectRow> {
    let mut rows = Vec::new();
    let mut queue = VecDeque::new();

    if let Some(root) = host.root_handle() {
        queue.push_back((root, 0));
    }

    while let Some((node, depth)) = queue.pop_front() {
        rows.push(InspectRow {
            depth,
            resource_id: or_empty(node.resource_id()),
            class_name: or_empty(node.class_name()),
            identity: identity(&*node),
            category: NodeCategory::of(&*node),
            target: is_target(&*node, capabilities),
        });

        for index in 0..node.child_count() {
            if let Some(child) = node.child_at(index) {
                queue.push_back((child, depth + 1));
            }
        }
    }

    rows
}

pub fn cmd_inspect(tree: &str, config: &ServiceConfig) -> Result<()> {
    let host = SnapshotHost::new(NodeSpec::load(Path::new(tree))?);
    let rows = inspect_tree(&host, &config.capabilities);

    for row in &rows {
        println!(
            "{}{} [{}] {:?}{}  {}",
            "  ".repeat(row.depth),
            if row.resource_id.is_empty() { "<no id>" } else { row.resource_id.as_str() },
            row.class_name,
            row.category,
            if row.target { " TARGET" } else { "" },
            row.identity,
        );
    }

    let targets = rows.iter().filter(|r| r.target).count();
    println!("{} nodes, {} search targets", rows.len(), targets);
    Ok(())
}

// ============================================================================
// replay subcommand
// ============================================================================

/// Scripted host events, e.g.
///
/// ```yaml
/// steps:
///   - event: screen_changed
///     tree: home.json
///   - event: content_changed
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub steps: Vec<SessionStep>,
}

/// One event. `tree`/`inline` replace the host tree before the event is
/// delivered; `no_window` removes it.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionStep {
    pub event: EventKind,

    /// Tree file, relative to the session file
    #[serde(default)]
    pub tree: Option<String>,

    #[serde(default)]
    pub inline: Option<NodeSpec>,

    #[serde(default)]
    pub no_window: bool,
}

#[derive(Debug, Clone)]
pub struct ReplaySummary {
    pub snapshot: EngineSnapshot,
    pub actions: Vec<ActionRecord>,
    pub live_handles: usize,
}

impl ReplaySummary {
    /// Number of complete search sequences (accepted submits).
    pub fn searches(&self) -> usize {
        self.actions
            .iter()
            .filter(|r| r.action == ActionKind::Submit && r.accepted)
            .count()
    }
}

pub fn load_session(path: &Path) -> Result<Session> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

pub async fn replay_session(
    session: &Session,
    base_dir: &Path,
    config: ServiceConfig,
) -> Result<ReplaySummary> {
    let host = SnapshotHost::empty();
    let mut service = SearchService::new(config);
    service.on_service_start()?;

    for step in &session.steps {
        if step.no_window {
            host.set_tree(None);
        } else if let Some(inline) = &step.inline {
            host.set_tree(Some(inline.clone()));
        } else if let Some(tree) = &step.tree {
            host.set_tree(Some(NodeSpec::load(&base_dir.join(tree))?));
        }

        service.on_event(AccessibilityEvent::new(step.event), &host);
        // one step at a time so content changes never exceed the in-flight limit
        service.sync().await?;
    }

    let snapshot = service.sync().await?;
    drop(service);

    let journal = host.journal();
    Ok(ReplaySummary {
        snapshot,
        actions: journal.actions(),
        live_handles: journal.live(),
    })
}

/// Returns whether at least one search was submitted.
pub async fn cmd_replay(session_path: &str, config: ServiceConfig, verbose: u8) -> Result<bool> {
    let path = Path::new(session_path);
    let session = load_session(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let summary = replay_session(&session, base_dir, config).await?;

    if verbose > 0 {
        for record in &summary.actions {
            println!(
                "  {:?} on {} → {}",
                record.action,
                record.node,
                if record.accepted { "ok" } else { "rejected" }
            );
        }
    }

    println!(
        "Replayed {} events: {} searches, generation {}, {} processed",
        session.steps.len(),
        summary.searches(),
        summary.snapshot.generation,
        summary.snapshot.processed.len()
    );
    if let Some(last) = &summary.snapshot.last_drain {
        println!(
            "Last drain: {:?} after {} nodes",
            last.outcome,
            last.visited.len()
        );
    }

    Ok(summary.searches() > 0)
}
