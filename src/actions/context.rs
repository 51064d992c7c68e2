use std::sync::Arc;

use serde_json::Value;

use crate::clock::Clock;
use crate::config::ConsistencyMode;
use crate::error::RemoteError;
use crate::gamification::GamificationEngine;
use crate::notifications::NotificationSink;
use crate::remote::{DocumentStore, FieldDeltas};

/// Everything an executor needs to replay one action.
pub struct ActionContext {
    pub remote: Arc<dyn DocumentStore>,
    pub notifications: Arc<dyn NotificationSink>,
    pub gamification: Arc<dyn GamificationEngine>,
    pub clock: Arc<dyn Clock>,
    pub consistency: ConsistencyMode,
    pub cas_attempts: u32,
}

impl ActionContext {
    /// How many read-modify-write rounds an executor gets before giving up
    /// on a denormalized update.
    pub fn update_attempts(&self) -> u32 {
        match self.consistency {
            ConsistencyMode::BestEffort => 1,
            ConsistencyMode::CompareAndSwap => self.cas_attempts.max(1),
        }
    }

    /// Applies a read-modify-write update under the configured consistency
    /// mode. `guard` names the field that was read and the exact value it
    /// held; in CAS mode the write only lands if that field is unchanged.
    /// Returns whether the update was applied.
    pub async fn update_guarded(
        &self,
        collection: &str,
        id: &str,
        guard: (&str, Value),
        deltas: FieldDeltas,
    ) -> Result<bool, RemoteError> {
        match self.consistency {
            ConsistencyMode::BestEffort => {
                self.remote.update_fields(collection, id, deltas).await?;
                Ok(true)
            }
            ConsistencyMode::CompareAndSwap => {
                self.remote
                    .compare_and_update(collection, id, &[(guard.0.to_string(), guard.1)], deltas)
                    .await
            }
        }
    }
}
