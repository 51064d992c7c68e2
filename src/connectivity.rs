use std::sync::Arc;

use tokio::sync::watch;

use crate::state::SharedState;
use crate::status::StatusHandle;
use crate::sync;

/// Reachability of the remote store's network path, as reported by the
/// platform.
///
/// Purely event-driven: the host feeds transitions in via `set_online`, no
/// polling. The signal is a heuristic — "online" may still mean the store
/// endpoint is unreachable, in which case replay calls fail normally and
/// the queue is retained.
pub struct ConnectivityMonitor {
    tx: watch::Sender<bool>,
    status: Arc<StatusHandle>,
}

impl ConnectivityMonitor {
    pub fn new(status: Arc<StatusHandle>) -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx, status }
    }

    /// Publishes a reachability transition from the platform signal. The
    /// observable flag flips synchronously.
    pub fn set_online(&self, online: bool) {
        self.status.set_online(online);
        self.tx.send_replace(online);
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Watches connectivity edges and fires a replay on every offline→online
/// transition. Going offline only flips the observable flag; an in-flight
/// replay is never aborted.
pub fn spawn_reconnect_loop(
    state: SharedState,
    mut shutdown: watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    let mut connectivity = state.connectivity.subscribe();
    tokio::spawn(async move {
        let mut was_online = *connectivity.borrow();
        loop {
            tokio::select! {
                changed = connectivity.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let online = *connectivity.borrow_and_update();
                    if online && !was_online {
                        tracing::info!("Connectivity regained, triggering replay");
                        sync::trigger_replay(&state);
                    }
                    was_online = online;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("Reconnect loop stopped");
    })
}
