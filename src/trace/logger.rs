use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::warn;

use crate::error::Result;
use crate::trace::trace::{TraceEvent, TraceKind};

/// Buffered JSON-lines sink for engine decisions.
///
/// Lines are buffered per drain and flushed when a generation starts or a
/// drain ends, so a trace file never holds half a drain.
pub struct TraceLogger {
    writer: Mutex<BufWriter<File>>,
    failed: AtomicBool,
}

impl TraceLogger {
    /// Open `path` for appending.
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            failed: AtomicBool::new(false),
        })
    }

    pub fn record(&self, event: &TraceEvent) -> Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        serde_json::to_writer(&mut *writer, event)?;
        writer.write_all(b"\n")?;
        if matches!(event.kind, TraceKind::Reset | TraceKind::DrainEnd) {
            writer.flush()?;
        }
        Ok(())
    }

    /// Like `record`, but the first failure is reported and disables the sink.
    pub fn log(&self, event: &TraceEvent) {
        if self.has_failed() {
            return;
        }
        if let Err(e) = self.record(event) {
            if !self.failed.swap(true, Ordering::Relaxed) {
                warn!("engine trace disabled after write failure: {}", e);
            }
        }
    }

    pub fn has_failed(&self) -> bool {
        self.failed.load(Ordering::Relaxed)
    }
}
