use async_trait::async_trait;
use chrono::Duration;
use serde_json::{Value, json};

use super::context::ActionContext;
use super::{ActionError, ActionExecutor};
use crate::models::{ActionKind, PostNoticePayload};
use crate::remote::FieldDelta;

const BROADCAST_EXPIRY_DAYS: i64 = 30;

/// Replays posting a notice to a class feed, plus the broadcast record
/// that fans it out to devices that have not joined the class yet.
pub struct PostNoticeExecutor;

#[async_trait]
impl ActionExecutor for PostNoticeExecutor {
    fn kind(&self) -> ActionKind {
        ActionKind::PostNotice
    }

    async fn execute(&self, ctx: &ActionContext, payload: &Value) -> Result<(), ActionError> {
        let payload: PostNoticePayload = serde_json::from_value(payload.clone())?;

        let now = ctx.clock.now();
        let notice = json!({
            "id": now.timestamp_millis().to_string(),
            "text": payload.text.clone(),
            "author": payload.author_name.clone(),
            "authorId": payload.author_id.clone(),
            "timestamp": now,
        });

        let mut posted = false;
        for _ in 0..ctx.update_attempts() {
            let Some(class) = ctx.remote.get_document("classes", &payload.class_id).await? else {
                // Class was deleted; nothing to post to.
                return Ok(());
            };

            let guard = class.get("notices").cloned().unwrap_or(Value::Null);
            let mut notices: Vec<Value> = match &guard {
                Value::Array(list) => list.clone(),
                _ => Vec::new(),
            };
            notices.insert(0, notice.clone());

            let deltas = vec![
                ("notices".to_string(), FieldDelta::Set(Value::Array(notices))),
                ("noticeCount".to_string(), FieldDelta::Increment(1)),
            ];
            if ctx
                .update_guarded("classes", &payload.class_id, ("notices", guard), deltas)
                .await?
            {
                posted = true;
                break;
            }
        }
        if !posted {
            return Err(ActionError::from(format!(
                "Concurrent modification of class {} notices",
                payload.class_id
            )));
        }

        let broadcast = json!({
            "classId": payload.class_id.clone(),
            "type": "notice_post",
            "title": "Novo Aviso",
            "summary": format!("Professor {}: \"{}\"", payload.author_name, payload.text),
            "authorName": payload.author_name.clone(),
            "timestamp": now,
            "expiresAt": now + Duration::days(BROADCAST_EXPIRY_DAYS),
            "deepLink": { "page": "join_class" },
        });
        ctx.remote.add_document("broadcasts", broadcast).await?;

        Ok(())
    }
}
