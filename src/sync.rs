use std::sync::atomic::Ordering;

use serde::Serialize;
use uuid::Uuid;

use crate::actions::ActionError;
use crate::error::StoreError;
use crate::models::{ActionKind, QueuedAction, ReplayReport};
use crate::state::SharedState;
use crate::store::StoredAction;

/// Records an intent that could not be applied online.
///
/// Local persistence only: the call never touches the network, and the
/// pending count moves before it returns. A failed local write fails the
/// call and leaves the count untouched; retrying the enqueue itself is the
/// caller's responsibility.
pub fn enqueue<P: Serialize>(
    state: &SharedState,
    kind: ActionKind,
    payload: &P,
) -> Result<Uuid, StoreError> {
    let action = QueuedAction {
        id: Uuid::now_v7(),
        kind,
        payload: serde_json::to_value(payload)?,
        enqueued_at: state.context.clock.now(),
    };
    let seq = state.store.append(&action)?;
    state.status.add_pending(1);
    tracing::debug!("Enqueued {kind} as {} (seq {seq})", action.id);
    Ok(action.id)
}

/// Fire-and-forget replay trigger; safe when idle, empty, or mid-pass.
pub fn trigger_replay(state: &SharedState) {
    let state = state.clone();
    tokio::spawn(async move {
        sync_now(&state).await;
    });
}

/// Replays the queue now, returning the combined outcome.
///
/// At most one replay runs at a time: a call landing mid-pass schedules one
/// follow-up pass on the active runner and returns empty-handed instead of
/// racing it. Two concurrent runners would each load the same snapshot and
/// the loser's retained view would silently win on disk.
pub async fn sync_now(state: &SharedState) -> ReplayReport {
    if state
        .syncing
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        state.rerun.store(true, Ordering::SeqCst);
        return ReplayReport::default();
    }

    let mut total = ReplayReport::default();
    loop {
        let report = run_pass(state).await;
        total.synced += report.synced;
        total.failed += report.failed;

        state.syncing.store(false, Ordering::SeqCst);
        let rerun_requested = state.rerun.swap(false, Ordering::SeqCst);
        if rerun_requested
            && state
                .syncing
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            continue;
        }
        break;
    }
    total
}

/// One pass over a fresh snapshot of the persisted queue, strictly in
/// enqueue order. Failures are retained in place and keep their sequence
/// numbers, so they stay ahead of anything enqueued later; successes are
/// dropped one record at a time.
async fn run_pass(state: &SharedState) -> ReplayReport {
    let snapshot = state.store.load();
    if snapshot.is_empty() {
        return ReplayReport::default();
    }

    state.status.set_syncing(true);
    tracing::info!("Replaying {} queued actions", snapshot.len());

    let mut report = ReplayReport::default();
    for StoredAction { seq, action } in snapshot {
        match replay_one(state, &action).await {
            Ok(()) => match state.store.remove(seq) {
                Ok(()) => {
                    state.status.drop_pending(1);
                    report.synced += 1;
                }
                Err(e) => {
                    // The action applied but its record survived; it will
                    // re-run on the next pass, which executors tolerate.
                    tracing::warn!("Failed to drop replayed action {}: {e}", action.id);
                    report.failed += 1;
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Action {} ({}) failed, retained for retry: {e}",
                    action.id,
                    action.kind
                );
                report.failed += 1;
            }
        }
    }

    state.status.set_syncing(false);
    state.outcome_tx.send_replace(Some(report));
    tracing::info!(
        "Replay pass finished: {} synced, {} failed",
        report.synced,
        report.failed
    );
    report
}

async fn replay_one(state: &SharedState, action: &QueuedAction) -> Result<(), ActionError> {
    let Some(executor) = state.executors.get(action.kind) else {
        return Err(ActionError::from(format!(
            "No executor registered for {}",
            action.kind
        )));
    };

    tracing::debug!("Replaying {} ({})", action.id, action.kind);
    match tokio::time::timeout(
        state.config.action_timeout,
        executor.execute(&state.context, &action.payload),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(ActionError::from(format!(
            "Action timed out after {}s",
            state.config.action_timeout.as_secs()
        ))),
    }
}
