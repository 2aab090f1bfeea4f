pub mod cli;
pub mod engine;
pub mod error;
pub mod node;
pub mod service;
pub mod trace;

pub use engine::traversal::{DrainOutcome, DrainReport, EngineSnapshot, TraversalEngine};
pub use error::{Error, Result};
pub use node::node_model::{HostCapabilities, NodeHandle, UiNode};
pub use service::event::{AccessibilityEvent, EventKind, RootProvider};
pub use service::lifecycle::{SearchService, ServiceConfig};
