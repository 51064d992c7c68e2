use serde::{Deserialize, Serialize};

/// Grading mode for objective (multiple-choice) questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradingMode {
    #[default]
    Automatic,
    Manual,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingConfig {
    #[serde(default)]
    pub objective_questions: GradingMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    MultipleChoice,
    Text,
    /// Item kinds this engine does not grade; carried through untouched.
    #[serde(other)]
    Unknown,
}

/// One question inside an activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityItem {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(default)]
    pub points: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_option_id: Option<String>,
}

/// Activity metadata captured at enqueue time, so replay needs no state
/// that may be gone after a process restart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySnapshot {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(default)]
    pub items: Vec<ActivityItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grading_config: Option<GradingConfig>,
}

/// Status tags a submission record carries in the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Graded,
    PendingReview,
}
