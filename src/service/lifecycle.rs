use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::engine::traversal::{
    DEFAULT_QUERY, EngineSnapshot, EnqueueOutcome, Interrupter, TraversalEngine,
};
use crate::error::{Error, Result};
use crate::node::node_model::{HostCapabilities, NodeHandle};
use crate::service::event::{AccessibilityEvent, EventKind, RootProvider};
use crate::trace::logger::TraceLogger;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

// ============================================================================
// Service configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Text typed into the search field.
    pub query: String,

    /// Resolved once from the host API level.
    pub capabilities: HostCapabilities,

    /// Content-change requests allowed in flight; further ones are dropped.
    /// Screen resets are never dropped.
    pub channel_capacity: usize,

    /// Optional JSON-lines trace of engine decisions.
    pub trace_path: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            query: DEFAULT_QUERY.to_string(),
            capabilities: HostCapabilities::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            trace_path: None,
        }
    }
}

// ============================================================================
// Hand-off protocol
// ============================================================================

/// Requests executed in order by the processing context.
#[derive(Debug)]
enum Command {
    /// New screen: clear queue and processed set, then enqueue the root.
    Reset(NodeHandle),
    /// Same screen, new content: enqueue the root.
    Enqueue(NodeHandle),
    /// Barrier: reply once every earlier command has run.
    Sync(oneshot::Sender<EngineSnapshot>),
}

struct Running {
    sender: mpsc::UnboundedSender<Command>,
    pending_enqueues: Arc<AtomicUsize>,
    interrupter: Interrupter,
}

impl Running {
    /// Reserve an in-flight content-change slot.
    fn admit_enqueue(&self, capacity: usize) -> bool {
        self.pending_enqueues
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < capacity).then_some(n + 1)
            })
            .is_ok()
    }

    /// Hard stop. The worker thread is detached, not joined.
    fn stop(self) {
        self.interrupter.interrupt();
        drop(self.sender);
    }
}

// ============================================================================
// Search service
// ============================================================================

/// Host-facing lifecycle surface around one `TraversalEngine`.
///
/// All engine work runs on a dedicated processing thread fed through one
/// FIFO channel; the host's calling context only hands requests off.
pub struct SearchService {
    config: ServiceConfig,
    running: Option<Running>,
}

impl SearchService {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            running: None,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Create the processing context: one named thread owning the engine.
    pub fn on_service_start(&mut self) -> Result<()> {
        if self.running.is_some() {
            debug!("service already started");
            return Ok(());
        }

        let mut engine = TraversalEngine::new(self.config.capabilities, &self.config.query);
        if let Some(path) = &self.config.trace_path {
            engine = engine.with_tracer(Arc::new(TraceLogger::create(path)?));
        }

        let interrupter = engine.interrupter();
        let pending_enqueues = Arc::new(AtomicUsize::new(0));
        let (sender, receiver) = mpsc::unbounded_channel();

        let worker_pending = Arc::clone(&pending_enqueues);
        thread::Builder::new()
            .name("screen-search-processing".into())
            .spawn(move || run_worker(engine, receiver, worker_pending))?;

        info!(
            query = %self.config.query,
            capabilities = ?self.config.capabilities,
            "search service started"
        );

        self.running = Some(Running {
            sender,
            pending_enqueues,
            interrupter,
        });
        Ok(())
    }

    /// Single entry point for host events. Never fails; absent roots and a
    /// stopped service are no-ops.
    pub fn on_event(&self, event: AccessibilityEvent, provider: &dyn RootProvider) {
        let AccessibilityEvent { kind, source } = event;
        drop(source);

        let Some(running) = &self.running else {
            debug!(?kind, "event ignored, service not running");
            return;
        };

        let command = match kind {
            EventKind::ScreenChanged => provider.root_node().map(Command::Reset),
            EventKind::ContentChanged => {
                if !running.admit_enqueue(self.config.channel_capacity.max(1)) {
                    warn!("processing context busy, content change dropped");
                    return;
                }
                let root = provider.root_node();
                if root.is_none() {
                    running.pending_enqueues.fetch_sub(1, Ordering::SeqCst);
                }
                root.map(Command::Enqueue)
            }
            EventKind::Other => return,
        };

        let Some(command) = command else {
            debug!(?kind, "no active window");
            return;
        };

        if running.sender.send(command).is_err() {
            debug!(?kind, "processing context closed, event dropped");
        }
    }

    /// Hard stop: no further drains, pending nodes discarded, channel closed.
    pub fn on_interrupt(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        running.stop();
        info!("search service interrupted");
    }

    /// Wait until every request handed off so far has been processed.
    pub async fn sync(&self) -> Result<EngineSnapshot> {
        let running = self.running.as_ref().ok_or(Error::NotStarted)?;

        let (reply, response) = oneshot::channel();
        running
            .sender
            .send(Command::Sync(reply))
            .map_err(|_| Error::Closed)?;
        response.await.map_err(|_| Error::Closed)
    }
}

impl Drop for SearchService {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.stop();
        }
    }
}

// ============================================================================
// Processing context
// ============================================================================

fn run_worker(
    mut engine: TraversalEngine,
    mut receiver: mpsc::UnboundedReceiver<Command>,
    pending_enqueues: Arc<AtomicUsize>,
) {
    while let Some(command) = receiver.blocking_recv() {
        if engine.is_interrupted() {
            break;
        }

        match command {
            Command::Reset(root) => {
                engine.reset();
                schedule(&mut engine, root);
            }
            Command::Enqueue(root) => {
                pending_enqueues.fetch_sub(1, Ordering::SeqCst);
                schedule(&mut engine, root);
            }
            Command::Sync(reply) => {
                let _ = reply.send(engine.snapshot());
            }
        }
    }
    debug!("processing context finished");
}

fn schedule(engine: &mut TraversalEngine, root: NodeHandle) {
    match engine.enqueue(root) {
        EnqueueOutcome::StartDrain => {
            let report = engine.drain();
            debug!(
                visited = report.visited.len(),
                outcome = ?report.outcome,
                "drain finished"
            );
        }
        EnqueueOutcome::AlreadyDraining => {}
        EnqueueOutcome::Rejected => debug!("enqueue rejected, engine interrupted"),
    }
}
