use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::{subtask, todo},
    models::ids,
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Subtask {
    pub id: Uuid,
    pub todo_id: Uuid,
    pub title: String,
    pub is_completed: bool,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subtask {
    fn from_model(model: subtask::Model, todo_uuid: Uuid) -> Self {
        Self {
            id: model.uuid,
            todo_id: todo_uuid,
            title: model.title,
            is_completed: model.is_completed,
            sort_order: model.sort_order,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    /// Subtasks of the given todos keyed by todo row id, each list in order.
    pub(crate) async fn by_todo_row_ids<C: ConnectionTrait>(
        db: &C,
        todos: &HashMap<i64, Uuid>,
    ) -> Result<HashMap<i64, Vec<Self>>, DbErr> {
        let mut grouped: HashMap<i64, Vec<Self>> = HashMap::new();
        if todos.is_empty() {
            return Ok(grouped);
        }
        let records = subtask::Entity::find()
            .filter(subtask::Column::TodoId.is_in(todos.keys().copied().collect::<Vec<_>>()))
            .order_by_asc(subtask::Column::SortOrder)
            .order_by_asc(subtask::Column::Id)
            .all(db)
            .await?;
        for model in records {
            let Some(todo_uuid) = todos.get(&model.todo_id).copied() else {
                continue;
            };
            grouped
                .entry(model.todo_id)
                .or_default()
                .push(Self::from_model(model, todo_uuid));
        }
        Ok(grouped)
    }

    /// Loads a subtask only when its parent todo belongs to `owner_id`.
    async fn find_owned_model<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<(subtask::Model, Uuid)>, DbErr> {
        let owner_row_id = ids::require_user_id(db, owner_id).await?;
        let Some(record) = subtask::Entity::find()
            .filter(subtask::Column::Uuid.eq(id))
            .one(db)
            .await?
        else {
            return Ok(None);
        };
        let parent = todo::Entity::find_by_id(record.todo_id)
            .filter(todo::Column::OwnerId.eq(owner_row_id))
            .one(db)
            .await?;
        Ok(parent.map(|parent| (record, parent.uuid)))
    }

    pub async fn find_owned<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        Ok(Self::find_owned_model(db, owner_id, id)
            .await?
            .map(|(model, todo_uuid)| Self::from_model(model, todo_uuid)))
    }

    /// Appends a subtask after the todo's current last one.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        todo_id: Uuid,
        title: &str,
    ) -> Result<Self, DbErr> {
        let todo_row_id = ids::todo_id_by_uuid(db, todo_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Todo not found".to_string()))?;

        let last = subtask::Entity::find()
            .filter(subtask::Column::TodoId.eq(todo_row_id))
            .order_by_desc(subtask::Column::SortOrder)
            .one(db)
            .await?;
        let next_order = last.map(|model| model.sort_order + 1).unwrap_or(0);

        let now = Utc::now();
        let active = subtask::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            todo_id: Set(todo_row_id),
            title: Set(title.to_string()),
            is_completed: Set(false),
            sort_order: Set(next_order),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model, todo_id))
    }

    pub async fn toggle<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Self, DbErr> {
        let (record, todo_uuid) = Self::find_owned_model(db, owner_id, id)
            .await?
            .ok_or(DbErr::RecordNotFound("Subtask not found".to_string()))?;

        let completed = !record.is_completed;
        let mut active: subtask::ActiveModel = record.into();
        active.is_completed = Set(completed);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(db).await?;
        Ok(Self::from_model(updated, todo_uuid))
    }

    pub async fn delete<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<u64, DbErr> {
        let Some((record, _)) = Self::find_owned_model(db, owner_id, id).await? else {
            return Ok(0);
        };
        let result = subtask::Entity::delete_by_id(record.id).exec(db).await?;
        Ok(result.rows_affected)
    }
}
