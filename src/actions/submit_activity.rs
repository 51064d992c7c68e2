use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::context::ActionContext;
use super::{ActionError, ActionExecutor};
use crate::models::{ActionKind, GradingMode, ItemType, SubmissionStatus, SubmitActivityPayload};
use crate::notifications::NotificationRequest;
use crate::remote::FieldDelta;

/// Replays a student's activity submission: grades objective answers from
/// the enqueue-time snapshot, upserts the submission record, and refreshes
/// the activity's denormalized submission list and counters.
pub struct SubmitActivityExecutor;

#[async_trait]
impl ActionExecutor for SubmitActivityExecutor {
    fn kind(&self) -> ActionKind {
        ActionKind::SubmitActivity
    }

    async fn execute(&self, ctx: &ActionContext, payload: &Value) -> Result<(), ActionError> {
        let payload: SubmitActivityPayload = serde_json::from_value(payload.clone())?;
        let SubmitActivityPayload {
            activity_id,
            content,
            user,
            activity_data,
        } = payload;

        // Answers are a question-id -> option-id map; anything unparseable
        // is legacy free-form text and grades as zero objective answers.
        let answers: HashMap<String, String> = serde_json::from_str(&content).unwrap_or_default();

        let mut score = 0.0;
        let mut has_open_questions = false;
        for item in &activity_data.items {
            match item.item_type {
                ItemType::Text => has_open_questions = true,
                ItemType::MultipleChoice => {
                    if let Some(correct) = &item.correct_option_id {
                        if answers.get(&item.id) == Some(correct) {
                            score += item.points;
                        }
                    }
                }
                ItemType::Unknown => {}
            }
        }

        let mode = activity_data
            .grading_config
            .as_ref()
            .map(|config| config.objective_questions)
            .unwrap_or_default();
        // An activity with no items never auto-grades.
        let status = if mode == GradingMode::Automatic
            && !has_open_questions
            && !activity_data.items.is_empty()
        {
            SubmissionStatus::Graded
        } else {
            SubmissionStatus::PendingReview
        };

        let now = ctx.clock.now();
        let mut record = json!({
            "studentId": user.id.clone(),
            "studentName": user.name.clone(),
            "submissionDate": now.to_rfc3339(),
            "content": content,
            "status": status,
            "timestamp": now,
        });
        if status == SubmissionStatus::Graded {
            record["grade"] = json!(score);
            record["gradedAt"] = json!(now.to_rfc3339());
            record["feedback"] = json!("Correção automática.");
        }

        // Authoritative write first. The record is keyed by student, so a
        // replayed duplicate overwrites instead of forking.
        let submissions_path = format!("activities/{activity_id}/submissions");
        ctx.remote
            .set_document(&submissions_path, &user.id, record.clone(), false)
            .await?;

        update_activity_rollup(ctx, &activity_id, &user.id, &record, status).await?;

        if status == SubmissionStatus::Graded {
            let request = NotificationRequest {
                user_id: user.id.clone(),
                actor_id: "system".into(),
                actor_name: "Sistema".into(),
                kind: "activity_correction".into(),
                title: "Atividade Corrigida Automaticamente".into(),
                text: format!(
                    "Sua atividade \"{}\" foi corrigida. Nota: {score}",
                    activity_data.title
                ),
                class_id: activity_data.class_id.clone(),
                activity_id: Some(activity_id.clone()),
            };
            if let Err(e) = ctx.notifications.create(request).await {
                tracing::warn!("Submission notification failed for {activity_id}: {e}");
            }
        }

        // Base points are zero; the scoring engine decides the reward.
        if let Err(e) = ctx
            .gamification
            .process_event(&user.id, "activity_sent", 0)
            .await
        {
            tracing::warn!("Gamification event failed for {}: {e}", user.id);
        }

        Ok(())
    }
}

/// Read-modify-write of the activity's embedded submission list. A missing
/// activity document leaves the standalone record as the only trace.
async fn update_activity_rollup(
    ctx: &ActionContext,
    activity_id: &str,
    student_id: &str,
    record: &Value,
    status: SubmissionStatus,
) -> Result<(), ActionError> {
    for _ in 0..ctx.update_attempts() {
        let Some(activity) = ctx.remote.get_document("activities", activity_id).await? else {
            return Ok(());
        };

        let guard = activity.get("submissions").cloned().unwrap_or(Value::Null);
        let mut submissions: Vec<Value> = match &guard {
            Value::Array(list) => list.clone(),
            _ => Vec::new(),
        };

        let existing = submissions.iter().position(|entry| {
            entry.get("studentId").and_then(Value::as_str) == Some(student_id)
        });
        let first_entry = existing.is_none();
        match existing {
            Some(idx) => submissions[idx] = super::merge_fields(&submissions[idx], record),
            None => submissions.push(record.clone()),
        }

        let mut deltas = vec![(
            "submissions".to_string(),
            FieldDelta::Set(Value::Array(submissions)),
        )];
        if first_entry {
            deltas.push(("submissionCount".to_string(), FieldDelta::Increment(1)));
            if status == SubmissionStatus::PendingReview {
                deltas.push((
                    "pendingSubmissionCount".to_string(),
                    FieldDelta::Increment(1),
                ));
            }
        }

        if ctx
            .update_guarded("activities", activity_id, ("submissions", guard), deltas)
            .await?
        {
            return Ok(());
        }
    }

    Err(ActionError::from(format!(
        "Concurrent modification of activity {activity_id} submissions"
    )))
}
