use db::{
    DatabaseConnection,
    models::activity::{Activity, ActivityType, ActivityWithTodo, CreateActivity},
};
use serde_json::Value;
use uuid::Uuid;

use super::{auth::CurrentUser, error::ServiceError};

pub const DEFAULT_ACTIVITY_LIMIT: u64 = 50;
pub const MAX_ACTIVITY_LIMIT: u64 = 200;

/// Append-only audit trail of todo lifecycle events.
#[derive(Clone)]
pub struct ActivityRecorder {
    db: DatabaseConnection,
}

impl ActivityRecorder {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends an entry. A failed write is logged and never propagated, so the
    /// operation that triggered it still succeeds.
    pub async fn record(
        &self,
        activity_type: ActivityType,
        description: String,
        actor_id: Uuid,
        todo_id: Option<Uuid>,
        metadata: Option<Value>,
    ) -> Option<Activity> {
        let data = CreateActivity {
            activity_type,
            description,
            user_id: actor_id,
            todo_id,
            metadata,
        };
        match Activity::create(&self.db, &data).await {
            Ok(activity) => Some(activity),
            Err(err) => {
                tracing::warn!(
                    activity_type = %activity_type,
                    user_id = %actor_id,
                    todo_id = ?todo_id,
                    error = %err,
                    "failed to record activity"
                );
                None
            }
        }
    }

    pub async fn list(
        &self,
        user: &CurrentUser,
        limit: Option<u64>,
    ) -> Result<Vec<ActivityWithTodo>, ServiceError> {
        let limit = limit
            .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
            .clamp(1, MAX_ACTIVITY_LIMIT);
        Ok(Activity::find_recent_for_user(&self.db, user.id, limit).await?)
    }
}
