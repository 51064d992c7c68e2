use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use serde::Serialize;

/// Observable snapshot of the sync engine, consumed by offline indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub pending_count: usize,
    pub is_syncing: bool,
    pub is_online: bool,
}

/// Lock-free counters behind the status surface.
///
/// `pending` tracks the persisted queue length and moves synchronously with
/// every enqueue and every successfully replayed action, so consumers never
/// observe a count the durable queue does not back.
#[derive(Debug)]
pub struct StatusHandle {
    pending: AtomicUsize,
    syncing: AtomicBool,
    online: AtomicBool,
}

impl StatusHandle {
    pub fn new(pending: usize, online: bool) -> Self {
        Self {
            pending: AtomicUsize::new(pending),
            syncing: AtomicBool::new(false),
            online: AtomicBool::new(online),
        }
    }

    pub fn snapshot(&self) -> SyncStatus {
        SyncStatus {
            pending_count: self.pending.load(Ordering::SeqCst),
            is_syncing: self.syncing.load(Ordering::SeqCst),
            is_online: self.online.load(Ordering::SeqCst),
        }
    }

    pub(crate) fn add_pending(&self, n: usize) {
        self.pending.fetch_add(n, Ordering::SeqCst);
    }

    pub(crate) fn drop_pending(&self, n: usize) {
        self.pending.fetch_sub(n, Ordering::SeqCst);
    }

    pub(crate) fn set_syncing(&self, syncing: bool) {
        self.syncing.store(syncing, Ordering::SeqCst);
    }

    pub(crate) fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}
