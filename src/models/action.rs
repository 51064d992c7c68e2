use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::activity::ActivitySnapshot;

/// Tag identifying which executor replays a queued action. Closed set;
/// extending it means adding a new tag and a matching executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    SubmitActivity,
    GradeActivity,
    PostNotice,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            ActionKind::SubmitActivity => "SUBMIT_ACTIVITY",
            ActionKind::GradeActivity => "GRADE_ACTIVITY",
            ActionKind::PostNotice => "POST_NOTICE",
        };
        write!(f, "{tag}")
    }
}

/// A recorded user intent held for replay once the remote store is
/// reachable again.
///
/// The payload must be self-sufficient: the process may restart before the
/// action runs, so the enqueuing caller snapshots everything its executor
/// will need. `id` exists for deduplication and display; replay idempotency
/// is the executor's job, per kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedAction {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub payload: serde_json::Value,
    #[serde(rename = "timestamp")]
    pub enqueued_at: DateTime<Utc>,
}

/// Aggregate outcome of one replay pass, surfaced as a transient notice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    pub synced: usize,
    pub failed: usize,
}

/// Who performed the action; denormalized into remote records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitActivityPayload {
    pub activity_id: String,
    /// Either a JSON map of question id to chosen option id, or legacy
    /// free-form text.
    pub content: String,
    pub user: UserRef,
    pub activity_data: ActivitySnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeActivityPayload {
    pub activity_id: String,
    pub student_id: String,
    pub grade: f64,
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<BTreeMap<String, f64>>,
    pub teacher_user: UserRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostNoticePayload {
    pub class_id: String,
    pub text: String,
    pub author_name: String,
    pub author_id: String,
}
