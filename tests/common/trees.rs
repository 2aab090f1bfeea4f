#![allow(dead_code)]

use screen_search::engine::identity::identity_key;
use screen_search::engine::traversal::{DrainReport, EnqueueOutcome, TraversalEngine};
use screen_search::node::snapshot::{NodeSpec, SnapshotHost};

/// root → [search_box]
pub fn search_screen() -> NodeSpec {
    NodeSpec::layout("root").with_child(NodeSpec::edit_text("search_box"))
}

/// root → [a → [a1], b]
pub fn bfs_screen() -> NodeSpec {
    NodeSpec::layout("root")
        .with_child(NodeSpec::layout("a").with_child(NodeSpec::layout("a1")))
        .with_child(NodeSpec::layout("b"))
}

/// Identity of a node that only carries a resource id.
pub fn key(resource_id: &str) -> String {
    identity_key(resource_id, "")
}

pub fn keys(resource_ids: &[&str]) -> Vec<String> {
    resource_ids.iter().map(|id| key(id)).collect()
}

/// Enqueue the host root and run the drain it starts.
pub fn drain_root(engine: &mut TraversalEngine, host: &SnapshotHost) -> DrainReport {
    let root = host.root_handle().expect("host has a root");
    assert_eq!(engine.enqueue(root), EnqueueOutcome::StartDrain);
    engine.drain()
}
