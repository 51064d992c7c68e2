use async_trait::async_trait;

use crate::error::RemoteError;

/// Opaque scoring engine invoked after a successful submission replay.
/// Returns the names of any achievements the event unlocked.
#[async_trait]
pub trait GamificationEngine: Send + Sync {
    async fn process_event(
        &self,
        user_id: &str,
        event: &str,
        base_points: i64,
    ) -> Result<Vec<String>, RemoteError>;
}

/// Engine that scores nothing; hosts without gamification plug this in.
pub struct NoopGamification;

#[async_trait]
impl GamificationEngine for NoopGamification {
    async fn process_event(
        &self,
        _user_id: &str,
        _event: &str,
        _base_points: i64,
    ) -> Result<Vec<String>, RemoteError> {
        Ok(Vec::new())
    }
}
