use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::sync::watch;

use crate::actions::ExecutorRegistry;
use crate::actions::context::ActionContext;
use crate::config::Config;
use crate::connectivity::ConnectivityMonitor;
use crate::models::ReplayReport;
use crate::status::StatusHandle;
use crate::store::SqliteQueueStore;

pub type SharedState = Arc<EngineState>;

/// Everything the sync engine owns, shared across tasks.
pub struct EngineState {
    pub config: Config,
    pub store: SqliteQueueStore,
    pub executors: ExecutorRegistry,
    pub context: ActionContext,
    pub status: Arc<StatusHandle>,
    pub connectivity: ConnectivityMonitor,
    /// Single-flight guard: at most one replay pass runs at a time.
    pub(crate) syncing: AtomicBool,
    /// A trigger that landed mid-pass; honored right after the pass ends.
    pub(crate) rerun: AtomicBool,
    pub(crate) outcome_tx: watch::Sender<Option<ReplayReport>>,
}

impl EngineState {
    /// Replay outcomes, one per finished pass; consumers surface these as
    /// transient notices.
    pub fn subscribe_outcomes(&self) -> watch::Receiver<Option<ReplayReport>> {
        self.outcome_tx.subscribe()
    }
}
