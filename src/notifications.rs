use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::clock::Clock;
use crate::error::RemoteError;
use crate::remote::DocumentStore;

/// A notification addressed to one user, attributed to an actor.
#[derive(Debug, Clone)]
pub struct NotificationRequest {
    pub user_id: String,
    pub actor_id: String,
    pub actor_name: String,
    pub kind: String,
    pub title: String,
    pub text: String,
    pub class_id: Option<String>,
    pub activity_id: Option<String>,
}

/// Downstream notification delivery. For replay these are best-effort: a
/// failed delivery is logged and never re-queues an action whose primary
/// write already landed.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn create(&self, request: NotificationRequest) -> Result<(), RemoteError>;
}

/// Default sink: writes notification documents into the remote store.
pub struct DocumentNotifier {
    remote: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl DocumentNotifier {
    pub fn new(remote: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { remote, clock }
    }
}

#[async_trait]
impl NotificationSink for DocumentNotifier {
    async fn create(&self, request: NotificationRequest) -> Result<(), RemoteError> {
        let fields = json!({
            "userId": request.user_id,
            "actorId": request.actor_id,
            "actorName": request.actor_name,
            "type": request.kind,
            "title": request.title,
            "text": request.text,
            "classId": request.class_id,
            "activityId": request.activity_id,
            "read": false,
            "timestamp": self.clock.now(),
        });
        self.remote.add_document("notifications", fields).await?;
        Ok(())
    }
}
