use sha1::{Digest, Sha1};

use crate::node::node_model::{UiNode, or_empty};

/// Stable dedup key for a node, derived from resource id and content description.
///
/// Two handles with the same attributes resolve to the same key, so an element
/// re-fetched after a content change is still recognised.
pub fn identity(node: &dyn UiNode) -> String {
    identity_key(
        &or_empty(node.resource_id()),
        &or_empty(node.content_description()),
    )
}

pub fn identity_key(resource_id: &str, content_description: &str) -> String {
    let mut hasher = Sha1::new();
    // length prefix keeps ("a|", "b") and ("a", "|b") apart
    hasher.update(format!("{}:{}|{}", resource_id.len(), resource_id, content_description).as_bytes());
    format!("node:{:x}", hasher.finalize())
}
