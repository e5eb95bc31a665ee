use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::{tag, todo_tag},
    models::ids,
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTag {
    pub name: String,
    pub color: String,
}

impl Tag {
    pub(crate) fn from_model(model: tag::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            color: model.color,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub async fn find_by_owner<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let owner_row_id = ids::require_user_id(db, owner_id).await?;
        let records = tag::Entity::find()
            .filter(tag::Column::OwnerId.eq(owner_row_id))
            .order_by_asc(tag::Column::Name)
            .order_by_asc(tag::Column::Id)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        data: &CreateTag,
    ) -> Result<Self, DbErr> {
        let owner_row_id = ids::require_user_id(db, owner_id).await?;
        let now = Utc::now();
        let active = tag::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            owner_id: Set(owner_row_id),
            name: Set(data.name.clone()),
            color: Set(data.color.clone()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    pub async fn delete<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<u64, DbErr> {
        let owner_row_id = ids::require_user_id(db, owner_id).await?;
        let Some(tag_row_id) = ids::tag_id_for_owner(db, id, owner_row_id).await? else {
            return Ok(0);
        };

        todo_tag::Entity::delete_many()
            .filter(todo_tag::Column::TagId.eq(tag_row_id))
            .exec(db)
            .await?;

        let result = tag::Entity::delete_many()
            .filter(tag::Column::Id.eq(tag_row_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
