use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;
use uuid::Uuid;

pub use crate::types::ActivityType;
use crate::{
    entities::{activity, todo},
    models::ids,
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Activity {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub description: String,
    #[ts(type = "Record<string, unknown> | null")]
    pub metadata: Option<Value>,
    pub user_id: Uuid,
    pub todo_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ActivityTodo {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActivityWithTodo {
    #[serde(flatten)]
    #[ts(flatten)]
    pub activity: Activity,
    pub todo: Option<ActivityTodo>,
}

#[derive(Debug, Clone)]
pub struct CreateActivity {
    pub activity_type: ActivityType,
    pub description: String,
    pub user_id: Uuid,
    pub todo_id: Option<Uuid>,
    pub metadata: Option<Value>,
}

impl Activity {
    fn from_model(model: activity::Model, user_id: Uuid, todo_id: Option<Uuid>) -> Self {
        Self {
            id: model.uuid,
            activity_type: model.activity_type,
            description: model.description,
            metadata: model.metadata,
            user_id,
            todo_id,
            created_at: model.created_at.into(),
        }
    }

    /// Appends an entry; activities are never updated or deleted.
    pub async fn create<C: ConnectionTrait>(db: &C, data: &CreateActivity) -> Result<Self, DbErr> {
        let user_row_id = ids::require_user_id(db, data.user_id).await?;
        let todo_row_id = match data.todo_id {
            Some(uuid) => ids::todo_id_by_uuid(db, uuid).await?,
            None => None,
        };

        let active = activity::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            user_id: Set(user_row_id),
            todo_id: Set(todo_row_id),
            activity_type: Set(data.activity_type),
            description: Set(data.description.clone()),
            metadata: Set(data.metadata.clone()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        let todo_id = todo_row_id.and(data.todo_id);
        Ok(Self::from_model(model, data.user_id, todo_id))
    }

    /// Most recent entries of the user, newest first. Entries whose todo was
    /// permanently deleted come back with `todo: None`.
    pub async fn find_recent_for_user<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
        limit: u64,
    ) -> Result<Vec<ActivityWithTodo>, DbErr> {
        let user_row_id = ids::require_user_id(db, user_id).await?;
        let records = activity::Entity::find()
            .filter(activity::Column::UserId.eq(user_row_id))
            .order_by_desc(activity::Column::CreatedAt)
            .order_by_desc(activity::Column::Id)
            .limit(limit)
            .all(db)
            .await?;

        let todo_row_ids: Vec<i64> = records.iter().filter_map(|r| r.todo_id).collect();
        let todos: HashMap<i64, (Uuid, String)> = if todo_row_ids.is_empty() {
            HashMap::new()
        } else {
            todo::Entity::find()
                .select_only()
                .column(todo::Column::Id)
                .column(todo::Column::Uuid)
                .column(todo::Column::Title)
                .filter(todo::Column::Id.is_in(todo_row_ids))
                .into_tuple::<(i64, Uuid, String)>()
                .all(db)
                .await?
                .into_iter()
                .map(|(id, uuid, title)| (id, (uuid, title)))
                .collect()
        };

        Ok(records
            .into_iter()
            .map(|record| {
                let todo = record
                    .todo_id
                    .and_then(|id| todos.get(&id))
                    .map(|(uuid, title)| ActivityTodo {
                        id: *uuid,
                        title: title.clone(),
                    });
                let activity =
                    Self::from_model(record, user_id, todo.as_ref().map(|todo| todo.id));
                ActivityWithTodo { activity, todo }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;
    use serde_json::json;

    use super::*;
    use crate::models::{
        todo::{CreateTodo, Todo},
        user::{CreateUser, User},
    };

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn recent_activity_survives_permanent_delete() {
        let db = setup_db().await;
        let user = User::create(
            &db,
            &CreateUser {
                name: None,
                email: "log@example.com".to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .unwrap();
        let todo = Todo::create(
            &db,
            user.id,
            &CreateTodo {
                title: "Buy milk".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        for activity_type in [ActivityType::Created, ActivityType::Completed] {
            Activity::create(
                &db,
                &CreateActivity {
                    activity_type,
                    description: format!("{activity_type} todo \"Buy milk\""),
                    user_id: user.id,
                    todo_id: Some(todo.id),
                    metadata: Some(json!({ "todo_title": "Buy milk" })),
                },
            )
            .await
            .unwrap();
        }

        let recent = Activity::find_recent_for_user(&db, user.id, 1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].activity.activity_type, ActivityType::Completed);
        assert_eq!(recent[0].todo.as_ref().map(|t| t.title.as_str()), Some("Buy milk"));

        Todo::delete_permanently(&db, user.id, todo.id).await.unwrap();

        let recent = Activity::find_recent_for_user(&db, user.id, 50).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|entry| entry.todo.is_none()));
        assert_eq!(
            recent[1].activity.metadata,
            Some(json!({ "todo_title": "Buy milk" }))
        );
    }
}
