use async_trait::async_trait;
use serde_json::{Value, json};

use super::context::ActionContext;
use super::{ActionError, ActionExecutor};
use crate::models::{ActionKind, GradeActivityPayload, SubmissionStatus};
use crate::notifications::NotificationRequest;
use crate::remote::FieldDelta;

/// Replays a teacher's correction of one student's submission.
///
/// A missing activity document or a missing entry in its submission list is
/// a silent no-op: the submission was removed, or never existed, and there
/// is nothing left to grade.
pub struct GradeActivityExecutor;

#[async_trait]
impl ActionExecutor for GradeActivityExecutor {
    fn kind(&self) -> ActionKind {
        ActionKind::GradeActivity
    }

    async fn execute(&self, ctx: &ActionContext, payload: &Value) -> Result<(), ActionError> {
        let payload: GradeActivityPayload = serde_json::from_value(payload.clone())?;

        let now = ctx.clock.now();
        let mut patch = json!({
            "status": SubmissionStatus::Graded,
            "grade": payload.grade,
            "feedback": payload.feedback.clone(),
            "gradedAt": now.to_rfc3339(),
        });
        if let Some(scores) = &payload.scores {
            patch["scores"] = json!(scores);
        }

        // (title, classId) of the activity, captured once the rollup lands.
        let mut graded: Option<(String, Option<String>)> = None;
        for _ in 0..ctx.update_attempts() {
            let Some(activity) = ctx
                .remote
                .get_document("activities", &payload.activity_id)
                .await?
            else {
                return Ok(());
            };

            let guard = activity.get("submissions").cloned().unwrap_or(Value::Null);
            let mut submissions: Vec<Value> = match &guard {
                Value::Array(list) => list.clone(),
                _ => Vec::new(),
            };
            let Some(idx) = submissions.iter().position(|entry| {
                entry.get("studentId").and_then(Value::as_str) == Some(payload.student_id.as_str())
            }) else {
                return Ok(());
            };

            // Authoritative record first, then the denormalized copy.
            let submissions_path = format!("activities/{}/submissions", payload.activity_id);
            ctx.remote
                .set_document(&submissions_path, &payload.student_id, patch.clone(), true)
                .await?;

            submissions[idx] = super::merge_fields(&submissions[idx], &patch);
            let deltas = vec![
                (
                    "submissions".to_string(),
                    FieldDelta::Set(Value::Array(submissions)),
                ),
                (
                    "pendingSubmissionCount".to_string(),
                    FieldDelta::Increment(-1),
                ),
            ];
            if ctx
                .update_guarded(
                    "activities",
                    &payload.activity_id,
                    ("submissions", guard),
                    deltas,
                )
                .await?
            {
                graded = Some((
                    activity
                        .get("title")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    activity
                        .get("classId")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                ));
                break;
            }
        }

        let Some((title, class_id)) = graded else {
            return Err(ActionError::from(format!(
                "Concurrent modification of activity {} submissions",
                payload.activity_id
            )));
        };

        let request = NotificationRequest {
            user_id: payload.student_id.clone(),
            actor_id: payload.teacher_user.id.clone(),
            actor_name: payload.teacher_user.name.clone(),
            kind: "activity_correction".into(),
            title: "Atividade Corrigida".into(),
            text: format!(
                "Sua atividade \"{title}\" foi corrigida. Nota: {}",
                payload.grade
            ),
            class_id,
            activity_id: Some(payload.activity_id.clone()),
        };
        if let Err(e) = ctx.notifications.create(request).await {
            tracing::warn!(
                "Grading notification failed for {}: {e}",
                payload.activity_id
            );
        }

        Ok(())
    }
}
