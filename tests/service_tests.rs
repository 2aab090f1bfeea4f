use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use screen_search::engine::traversal::DrainOutcome;
use screen_search::node::node_model::{HostCapabilities, NodeHandle, UiNode};
use screen_search::node::snapshot::{ActionKind, NodeSpec, SnapshotHost};
use screen_search::{AccessibilityEvent, Error, EventKind, SearchService, ServiceConfig};

use crate::common::trees::{key, search_screen};

mod common;

// =========================================================================
// Helpers
// =========================================================================

fn started(config: ServiceConfig) -> SearchService {
    let mut service = SearchService::new(config);
    service.on_service_start().unwrap();
    service
}

fn submits(host: &SnapshotHost) -> usize {
    host.journal()
        .actions()
        .iter()
        .filter(|r| r.action == ActionKind::Submit && r.accepted)
        .count()
}

fn screen_changed() -> AccessibilityEvent {
    AccessibilityEvent::new(EventKind::ScreenChanged)
}

fn content_changed() -> AccessibilityEvent {
    AccessibilityEvent::new(EventKind::ContentChanged)
}

/// Root whose child enumeration blocks until the test opens the gate.
/// Reports the name of the thread that reached it.
struct GatedNode {
    entered: mpsc::Sender<Option<String>>,
    gate: mpsc::Receiver<()>,
    child: Mutex<Option<NodeHandle>>,
}

impl UiNode for GatedNode {
    fn class_name(&self) -> Option<String> { Some("android.widget.FrameLayout".into()) }
    fn resource_id(&self) -> Option<String> { Some("gated".into()) }
    fn content_description(&self) -> Option<String> { None }
    fn hint_text(&self) -> Option<String> { None }
    fn text(&self) -> Option<String> { None }
    fn is_editable(&self) -> bool { false }

    fn child_count(&self) -> usize {
        let _ = self.entered.send(thread::current().name().map(String::from));
        let _ = self.gate.recv();
        usize::from(self.child.lock().unwrap().is_some())
    }

    fn child_at(&self, _index: usize) -> Option<NodeHandle> {
        self.child.lock().unwrap().take()
    }

    fn request_focus(&self) -> bool { false }
    fn set_text(&self, _value: &str) -> bool { false }
    fn submit(&self) -> bool { false }
}

struct Gate {
    entered: mpsc::Receiver<Option<String>>,
    open: mpsc::Sender<()>,
}

impl Gate {
    /// Block until the processing context is parked inside the gated node.
    fn wait_entered(&self) -> Option<String> {
        self.entered
            .recv_timeout(Duration::from_secs(5))
            .expect("processing context reached the gated node")
    }
}

/// One-shot provider handing out a gated root wrapping `child`.
fn gated_provider(child: Option<NodeHandle>) -> (impl Fn() -> Option<NodeHandle>, Gate) {
    let (entered_tx, entered) = mpsc::channel();
    let (open, gate) = mpsc::channel();
    let node = GatedNode {
        entered: entered_tx,
        gate,
        child: Mutex::new(child),
    };
    let slot = Mutex::new(Some(NodeHandle::new(node)));
    (move || slot.lock().unwrap().take(), Gate { entered, open })
}

fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    done()
}

// =========================================================================
// Start-up
// =========================================================================

#[test]
fn start_needs_no_async_runtime() {
    let host = SnapshotHost::new(search_screen());
    let service = started(ServiceConfig::default());
    service.on_event(screen_changed(), &host);

    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let snapshot = runtime.block_on(service.sync()).unwrap();

    assert_eq!(snapshot.generation, 1);
    assert_eq!(submits(&host), 1);
}

#[tokio::test]
async fn drain_runs_on_processing_thread() {
    let host = SnapshotHost::new(search_screen());
    let (provider, gate) = gated_provider(host.root_handle());
    let service = started(ServiceConfig::default());

    service.on_event(screen_changed(), &provider);
    let worker = gate.wait_entered();
    assert_eq!(worker.as_deref(), Some("screen-search-processing"));

    // the drain is parked, yet this runtime still schedules tasks
    let ready = tokio::spawn(async { 7 }).await.unwrap();
    assert_eq!(ready, 7);

    gate.open.send(()).unwrap();
    let snapshot = service.sync().await.unwrap();
    assert_eq!(snapshot.generation, 1);
    assert_eq!(snapshot.processed, vec![key("search_box")]);
    assert_eq!(submits(&host), 1);
}

#[tokio::test]
async fn sync_before_start_is_an_error() {
    let service = SearchService::new(ServiceConfig::default());
    assert!(matches!(service.sync().await, Err(Error::NotStarted)));
}

#[tokio::test]
async fn second_start_is_a_no_op() {
    let host = SnapshotHost::new(search_screen());
    let mut service = started(ServiceConfig::default());
    service.on_event(screen_changed(), &host);

    service.on_service_start().unwrap();

    let snapshot = service.sync().await.unwrap();
    assert_eq!(snapshot.generation, 1, "original processing context kept");
}

// =========================================================================
// Screen lifecycle
// =========================================================================

#[tokio::test]
async fn screen_changed_acts_on_search_box() {
    let host = SnapshotHost::new(search_screen());
    let service = started(ServiceConfig::default());

    service.on_event(screen_changed(), &host);
    let snapshot = service.sync().await.unwrap();

    assert_eq!(snapshot.generation, 1);
    assert_eq!(snapshot.processed, vec![key("search_box")]);
    assert_eq!(snapshot.queue_len, 0);
    assert!(!snapshot.draining);
    assert_eq!(snapshot.last_drain.unwrap().outcome, DrainOutcome::Acted);
    assert_eq!(host.journal().texts_set(), vec![("search_box".into(), "hello".into())]);
}

#[tokio::test]
async fn content_changed_keeps_generation_and_dedups() {
    let host = SnapshotHost::new(search_screen());
    let service = started(ServiceConfig::default());

    service.on_event(screen_changed(), &host);
    service.on_event(content_changed(), &host);
    let snapshot = service.sync().await.unwrap();

    assert_eq!(snapshot.generation, 1);
    assert_eq!(snapshot.processed, vec![key("search_box")]);
    assert_eq!(snapshot.last_drain.unwrap().outcome, DrainOutcome::Exhausted);
    assert_eq!(submits(&host), 1);
}

#[tokio::test]
async fn requests_run_in_hand_off_order() {
    let host = SnapshotHost::new(search_screen());
    let service = started(ServiceConfig::default());

    service.on_event(screen_changed(), &host);
    service.on_event(content_changed(), &host);
    service.on_event(screen_changed(), &host);
    let snapshot = service.sync().await.unwrap();

    // second reset clears the processed set, so the box is searched again
    assert_eq!(snapshot.generation, 2);
    assert_eq!(snapshot.last_drain.unwrap().outcome, DrainOutcome::Acted);
    assert_eq!(submits(&host), 2);
    assert_eq!(host.journal().live(), 0);
}

#[tokio::test]
async fn custom_query_and_old_host() {
    let host = SnapshotHost::new(search_screen());
    let service = started(ServiceConfig {
        query: "rust".into(),
        capabilities: HostCapabilities::for_api_level(29),
        ..ServiceConfig::default()
    });

    service.on_event(screen_changed(), &host);
    let snapshot = service.sync().await.unwrap();

    assert!(snapshot.processed.is_empty(), "no submit on old hosts");
    assert_eq!(host.journal().texts_set(), vec![("search_box".into(), "rust".into())]);
}

#[tokio::test]
async fn missing_root_is_a_no_op() {
    let host = SnapshotHost::empty();
    let service = started(ServiceConfig::default());

    service.on_event(screen_changed(), &host);
    service.on_event(content_changed(), &host);
    let snapshot = service.sync().await.unwrap();

    assert_eq!(snapshot.generation, 0);
    assert!(snapshot.last_drain.is_none());
}

#[tokio::test]
async fn closure_root_provider() {
    let host = SnapshotHost::new(search_screen());
    let service = started(ServiceConfig::default());
    let provider = || host.root_handle();

    service.on_event(screen_changed(), &provider);
    service.sync().await.unwrap();

    assert_eq!(submits(&host), 1);
}

#[tokio::test]
async fn other_event_releases_source_only() {
    let host = SnapshotHost::new(search_screen());
    let service = started(ServiceConfig::default());

    let source: NodeHandle = host.root_handle().unwrap();
    service.on_event(AccessibilityEvent::new(EventKind::Other).with_source(source), &host);
    let snapshot = service.sync().await.unwrap();

    let journal = host.journal();
    assert_eq!(journal.acquired(), 1, "root provider not consulted");
    assert_eq!(journal.live(), 0);
    assert_eq!(snapshot.generation, 0);
    assert!(journal.actions().is_empty());
}

#[tokio::test]
async fn resets_are_never_dropped() {
    let host = SnapshotHost::new(search_screen());
    let service = started(ServiceConfig {
        channel_capacity: 1,
        ..ServiceConfig::default()
    });

    service.on_event(screen_changed(), &host);
    service.sync().await.unwrap();

    service.on_event(content_changed(), &host);
    service.on_event(screen_changed(), &host);
    service.on_event(screen_changed(), &host);
    let snapshot = service.sync().await.unwrap();

    assert_eq!(snapshot.generation, 3);
    assert_eq!(submits(&host), 3, "each new screen searched once");
    assert_eq!(host.journal().live(), 0);
}

#[tokio::test]
async fn content_changes_beyond_capacity_are_dropped() {
    let host = SnapshotHost::new(search_screen());
    let (gated, gate) = gated_provider(None);
    let service = started(ServiceConfig {
        channel_capacity: 2,
        ..ServiceConfig::default()
    });

    // park the processing context so nothing is dequeued meanwhile
    service.on_event(screen_changed(), &gated);
    gate.wait_entered();

    let lookups = AtomicUsize::new(0);
    let provider = || {
        lookups.fetch_add(1, Ordering::SeqCst);
        host.root_handle()
    };
    for _ in 0..4 {
        service.on_event(content_changed(), &provider);
    }
    service.on_event(screen_changed(), &provider);
    assert_eq!(lookups.load(Ordering::SeqCst), 3, "two content changes and the reset");

    gate.open.send(()).unwrap();
    let snapshot = service.sync().await.unwrap();
    assert_eq!(snapshot.generation, 2);
    assert_eq!(submits(&host), 2);

    // dequeued requests free their slot
    service.on_event(content_changed(), &provider);
    service.sync().await.unwrap();
    assert_eq!(lookups.load(Ordering::SeqCst), 4);
    assert_eq!(host.journal().live(), 0);
}

// =========================================================================
// Interrupt
// =========================================================================

#[tokio::test]
async fn interrupt_stops_the_service() {
    let host = SnapshotHost::new(search_screen());
    let mut service = started(ServiceConfig::default());

    service.on_interrupt();
    assert!(!service.is_running());

    let source = host.root_handle().unwrap();
    service.on_event(screen_changed().with_source(source), &host);

    assert!(matches!(service.sync().await, Err(Error::NotStarted)));
    assert_eq!(host.journal().acquired(), 1);
    assert_eq!(host.journal().live(), 0);
    assert!(host.journal().actions().is_empty());
}

#[test]
fn interrupt_during_drain_stops_before_next_node() {
    let host = SnapshotHost::new(search_screen());
    let (provider, gate) = gated_provider(host.root_handle());
    let mut service = started(ServiceConfig::default());

    service.on_event(screen_changed(), &provider);
    gate.wait_entered();

    service.on_interrupt();
    gate.open.send(()).unwrap();

    assert!(wait_until(|| host.journal().live() == 0), "pending handles released");
    assert!(host.journal().actions().is_empty());
}

#[test]
fn dropping_the_service_interrupts_a_running_drain() {
    let host = SnapshotHost::new(search_screen());
    let (provider, gate) = gated_provider(host.root_handle());
    let service = started(ServiceConfig::default());

    service.on_event(screen_changed(), &provider);
    gate.wait_entered();

    drop(service);
    gate.open.send(()).unwrap();

    assert!(wait_until(|| host.journal().live() == 0), "pending handles released");
    assert!(host.journal().actions().is_empty());
}

#[tokio::test]
async fn restart_after_interrupt() {
    let host = SnapshotHost::new(search_screen());
    let mut service = started(ServiceConfig::default());
    service.on_interrupt();

    service.on_service_start().unwrap();
    service.on_event(screen_changed(), &host);
    let snapshot = service.sync().await.unwrap();

    assert_eq!(snapshot.generation, 1);
    assert_eq!(submits(&host), 1);
}

#[tokio::test]
async fn trace_path_from_config() {
    let path = std::env::temp_dir().join(format!("screen-search-service-{}.jsonl", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let host = SnapshotHost::new(NodeSpec::layout("root"));
    let service = started(ServiceConfig {
        trace_path: Some(path.clone()),
        ..ServiceConfig::default()
    });
    service.on_event(screen_changed(), &host);
    service.sync().await.unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 3, "reset, visit, drain end");
    let _ = std::fs::remove_file(&path);
}
