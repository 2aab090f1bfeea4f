use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, info, trace};

use crate::engine::executor::ActionExecutor;
use crate::engine::identity::identity;
use crate::engine::matcher::target_kind;
use crate::engine::work_queue::{ProcessingFlag, WorkQueue};
use crate::node::node_model::{HostCapabilities, NodeCategory, NodeHandle};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::{TraceEvent, TraceKind};

pub const DEFAULT_QUERY: &str = "hello";

// ============================================================================
// Outcomes and snapshots
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The flag was free: the caller must run a drain.
    StartDrain,
    /// A drain is active and will reach the node.
    AlreadyDraining,
    /// The engine was interrupted; the node was released.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DrainOutcome {
    /// Queue ran dry without a successful action.
    Exhausted,
    /// An action succeeded; the rest of the generation was abandoned.
    Acted,
    /// Stopped by an interrupt before the queue was exhausted.
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Identity keys in dequeue order.
    pub visited: Vec<String>,
    pub acted_on: Option<String>,
    pub outcome: DrainOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub queue_len: usize,
    /// Processed identity keys, sorted.
    pub processed: Vec<String>,
    pub draining: bool,
    pub generation: u64,
    pub last_drain: Option<DrainReport>,
}

// ============================================================================
// Interrupt handle
// ============================================================================

/// Cross-thread hard stop: no further dequeues, pending nodes discarded.
#[derive(Debug, Clone)]
pub struct Interrupter {
    queue: Arc<WorkQueue>,
    interrupted: Arc<AtomicBool>,
}

impl Interrupter {
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        let discarded = self.queue.clear();
        debug!(discarded, "engine interrupted");
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Traversal engine
// ============================================================================

/// Breadth-first search-bar finder.
///
/// The queue and flag are shared with producers; the processed set and the
/// generation counter belong to whichever context owns the engine. A
/// successful action ends the generation until the next `reset`.
pub struct TraversalEngine {
    queue: Arc<WorkQueue>,
    flag: Arc<ProcessingFlag>,
    interrupted: Arc<AtomicBool>,
    processed: HashSet<String>,

    executor: ActionExecutor,
    capabilities: HostCapabilities,
    query: String,

    generation: u64,
    last_drain: Option<DrainReport>,
    tracer: Option<Arc<TraceLogger>>,
}

impl TraversalEngine {
    pub fn new(capabilities: HostCapabilities, query: &str) -> Self {
        Self {
            queue: Arc::new(WorkQueue::new()),
            flag: Arc::new(ProcessingFlag::new()),
            interrupted: Arc::new(AtomicBool::new(false)),
            processed: HashSet::new(),
            executor: ActionExecutor::new(capabilities),
            capabilities,
            query: query.to_string(),
            generation: 0,
            last_drain: None,
            tracer: None,
        }
    }

    pub fn with_tracer(mut self, tracer: Arc<TraceLogger>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn interrupter(&self) -> Interrupter {
        Interrupter {
            queue: Arc::clone(&self.queue),
            interrupted: Arc::clone(&self.interrupted),
        }
    }

    /// Append a node; claims the processing flag if it is free.
    pub fn enqueue(&self, node: NodeHandle) -> EnqueueOutcome {
        if self.interrupted.load(Ordering::SeqCst) {
            return EnqueueOutcome::Rejected;
        }

        self.queue.push(node);
        if self.flag.try_acquire() {
            EnqueueOutcome::StartDrain
        } else {
            EnqueueOutcome::AlreadyDraining
        }
    }

    /// Start a new screen generation: queue and processed set are cleared together.
    ///
    /// Exclusive access means no drain is running, so the flag is freed too.
    pub fn reset(&mut self) {
        let discarded = self.queue.clear();
        self.processed.clear();
        self.flag.release();
        self.generation += 1;

        debug!(generation = self.generation, discarded, "screen reset");
        self.trace(|| TraceEvent::now(self.generation, TraceKind::Reset).with_detail(discarded));
    }

    /// Run one drain cycle to completion. Callers hold the flag (`StartDrain`).
    pub fn drain(&mut self) -> DrainReport {
        let mut visited = Vec::new();
        let mut acted_on = None;

        let outcome = loop {
            if self.interrupted.load(Ordering::SeqCst) {
                self.flag.release();
                break DrainOutcome::Interrupted;
            }

            // appends only happen through `&self` calls that `&mut self` excludes here
            let Some(node) = self.queue.pop() else {
                self.flag.release();
                break DrainOutcome::Exhausted;
            };

            let key = identity(&*node);
            trace!(identity = %key, "visit");
            self.trace(|| TraceEvent::now(self.generation, TraceKind::Visit).with_identity(&key));
            visited.push(key.clone());

            if !self.processed.contains(&key) && self.act_on(&node, &key) {
                self.processed.insert(key.clone());
                let abandoned = self.queue.clear();
                self.flag.release();

                info!(identity = %key, abandoned, "search submitted");
                acted_on = Some(key);
                break DrainOutcome::Acted;
            }

            self.expand(&node);
            node.release();
        };

        self.trace(|| {
            TraceEvent::now(self.generation, TraceKind::DrainEnd).with_outcome(&outcome, visited.len())
        });

        let report = DrainReport {
            visited,
            acted_on,
            outcome,
        };
        self.last_drain = Some(report.clone());
        report
    }

    pub fn is_processed(&self, key: &str) -> bool {
        self.processed.contains(key)
    }

    pub fn is_draining(&self) -> bool {
        self.flag.is_active()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let mut processed: Vec<String> = self.processed.iter().cloned().collect();
        processed.sort();

        EngineSnapshot {
            queue_len: self.queue.len(),
            processed,
            draining: self.flag.is_active(),
            generation: self.generation,
            last_drain: self.last_drain.clone(),
        }
    }

    fn act_on(&self, node: &NodeHandle, key: &str) -> bool {
        let Some(category) = target_kind(&**node, &self.capabilities) else {
            return false;
        };
        self.trace(|| {
            TraceEvent::now(self.generation, TraceKind::Match)
                .with_identity(key)
                .with_category(&category)
        });

        match category {
            NodeCategory::EditText => {
                let success = self.executor.try_search(&**node, &self.query);
                self.trace(|| {
                    TraceEvent::now(self.generation, TraceKind::Action)
                        .with_identity(key)
                        .with_success(success)
                });
                success
            }
            NodeCategory::Button => {
                // clicking search buttons is a reserved extension point
                debug!(identity = %key, "search button matched, click disabled");
                false
            }
            NodeCategory::Other => false,
        }
    }

    fn expand(&self, node: &NodeHandle) {
        for index in 0..node.child_count() {
            if let Some(child) = node.child_at(index) {
                self.queue.push(child);
            }
        }
    }

    fn trace(&self, event: impl FnOnce() -> TraceEvent) {
        if let Some(tracer) = &self.tracer {
            tracer.log(&event());
        }
    }
}
