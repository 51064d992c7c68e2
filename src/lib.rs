pub mod actions;
pub mod clock;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod gamification;
pub mod models;
pub mod notifications;
pub mod remote;
pub mod state;
pub mod status;
pub mod store;
pub mod sync;

use std::sync::Arc;

use tokio::sync::watch;

use crate::actions::ExecutorRegistry;
use crate::actions::context::ActionContext;
use crate::actions::grade_activity::GradeActivityExecutor;
use crate::actions::post_notice::PostNoticeExecutor;
use crate::actions::submit_activity::SubmitActivityExecutor;
use crate::clock::Clock;
use crate::config::Config;
use crate::connectivity::ConnectivityMonitor;
use crate::error::StoreError;
use crate::gamification::GamificationEngine;
use crate::notifications::NotificationSink;
use crate::remote::DocumentStore;
use crate::state::{EngineState, SharedState};
use crate::status::StatusHandle;
use crate::store::SqliteQueueStore;

pub use crate::models::{ActionKind, QueuedAction, ReplayReport};
pub use crate::status::SyncStatus;

/// External collaborators the host application supplies.
pub struct Services {
    pub remote: Arc<dyn DocumentStore>,
    pub notifications: Arc<dyn NotificationSink>,
    pub gamification: Arc<dyn GamificationEngine>,
    pub clock: Arc<dyn Clock>,
}

/// Builds the sync engine: opens the durable queue, registers the action
/// executors, and seeds the status surface from persisted state.
///
/// Connectivity starts as offline until the host reports otherwise via
/// `state.connectivity.set_online`.
pub fn build_engine(config: Config, services: Services) -> Result<SharedState, StoreError> {
    let store = SqliteQueueStore::open(&config.queue_path)?;

    let mut executors = ExecutorRegistry::new();
    executors.register(Arc::new(SubmitActivityExecutor));
    executors.register(Arc::new(GradeActivityExecutor));
    executors.register(Arc::new(PostNoticeExecutor));

    let context = ActionContext {
        remote: services.remote,
        notifications: services.notifications,
        gamification: services.gamification,
        clock: services.clock,
        consistency: config.consistency,
        cas_attempts: config.cas_attempts,
    };

    let pending = store.load().len();
    let status = Arc::new(StatusHandle::new(pending, false));
    let connectivity = ConnectivityMonitor::new(status.clone());
    let (outcome_tx, _) = watch::channel(None);

    tracing::info!("Sync engine ready, {pending} actions pending");

    Ok(Arc::new(EngineState {
        config,
        store,
        executors,
        context,
        status,
        connectivity,
        syncing: Default::default(),
        rerun: Default::default(),
        outcome_tx,
    }))
}

/// Spawns the reconnect listener that replays the queue whenever
/// connectivity comes back. Returns the shutdown handle (send `true` to
/// stop) and the task itself.
pub fn start(state: &SharedState) -> (watch::Sender<bool>, tokio::task::JoinHandle<()>) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = connectivity::spawn_reconnect_loop(state.clone(), shutdown_rx);
    (shutdown_tx, handle)
}
