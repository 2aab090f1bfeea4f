use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::node::node_model::NodeHandle;

/// FIFO of pending node handles. Any thread may append; one consumer drains.
#[derive(Debug, Default)]
pub struct WorkQueue {
    nodes: Mutex<VecDeque<NodeHandle>>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, node: NodeHandle) {
        self.lock().push_back(node);
    }

    pub fn pop(&self) -> Option<NodeHandle> {
        self.lock().pop_front()
    }

    /// Discard every pending handle, returning how many were dropped.
    pub fn clear(&self) -> usize {
        let discarded: Vec<NodeHandle> = self.lock().drain(..).collect();
        // handles are released outside the lock
        discarded.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<NodeHandle>> {
        self.nodes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Single-flight guard: set while a drain loop owns the queue.
#[derive(Debug, Default)]
pub struct ProcessingFlag {
    active: AtomicBool,
}

impl ProcessingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the flag. Returns `false` if a drain is already active.
    pub fn try_acquire(&self) -> bool {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}
