use crate::node::node_model::{HostCapabilities, NodeCategory, UiNode, or_empty};

pub const TARGET_KEYWORD: &str = "search";

/// Category of the node if it looks like a search bar, `None` otherwise.
pub fn target_kind(node: &dyn UiNode, capabilities: &HostCapabilities) -> Option<NodeCategory> {
    let category = NodeCategory::of(node);
    if category == NodeCategory::Other {
        return None;
    }

    let hint = if capabilities.hint_text {
        or_empty(node.hint_text())
    } else {
        String::new()
    };

    let signals = [
        or_empty(node.resource_id()),
        hint,
        or_empty(node.content_description()),
        or_empty(node.text()),
    ];

    signals
        .iter()
        .any(|s| mentions_keyword(s))
        .then_some(category)
}

pub fn is_target(node: &dyn UiNode, capabilities: &HostCapabilities) -> bool {
    target_kind(node, capabilities).is_some()
}

fn mentions_keyword(value: &str) -> bool {
    value.to_lowercase().contains(TARGET_KEYWORD)
}
