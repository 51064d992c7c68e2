pub mod context;
pub mod grade_activity;
pub mod post_notice;
pub mod submit_activity;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::models::ActionKind;
use context::ActionContext;

/// Why an executor run did not durably apply.
#[derive(Debug)]
pub struct ActionError {
    pub message: String,
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<String> for ActionError {
    fn from(s: String) -> Self {
        ActionError { message: s }
    }
}

impl From<&str> for ActionError {
    fn from(s: &str) -> Self {
        ActionError {
            message: s.to_string(),
        }
    }
}

impl From<RemoteError> for ActionError {
    fn from(err: RemoteError) -> Self {
        ActionError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(err: serde_json::Error) -> Self {
        ActionError {
            message: format!("Invalid payload: {err}"),
        }
    }
}

/// One executor per action kind: turns a queued payload into remote-store
/// mutations and side effects.
///
/// Executors must fail loudly on any step that did not durably apply, and
/// order their writes so the authoritative record lands before denormalized
/// state. Replay is at-least-once: a retried run must tolerate the writes
/// its previous run already committed.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    fn kind(&self) -> ActionKind;

    async fn execute(
        &self,
        ctx: &ActionContext,
        payload: &serde_json::Value,
    ) -> Result<(), ActionError>;
}

/// Shallow object merge: fields from `patch` win, other fields of
/// `existing` survive. Non-object inputs fall back to `patch`.
pub(crate) fn merge_fields(
    existing: &serde_json::Value,
    patch: &serde_json::Value,
) -> serde_json::Value {
    match (existing, patch) {
        (serde_json::Value::Object(base), serde_json::Value::Object(changes)) => {
            let mut merged = base.clone();
            for (key, value) in changes {
                merged.insert(key.clone(), value.clone());
            }
            serde_json::Value::Object(merged)
        }
        _ => patch.clone(),
    }
}

/// Registry of executors keyed by action kind.
pub struct ExecutorRegistry {
    executors: HashMap<ActionKind, Arc<dyn ActionExecutor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    pub fn register(&mut self, executor: Arc<dyn ActionExecutor>) {
        self.executors.insert(executor.kind(), executor);
    }

    pub fn get(&self, kind: ActionKind) -> Option<&Arc<dyn ActionExecutor>> {
        self.executors.get(&kind)
    }
}
