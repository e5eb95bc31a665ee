use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::{
    entities::{category, todo},
    models::ids,
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateCategory {
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
}

impl Category {
    pub(crate) fn from_model(model: category::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            color: model.color,
            icon: model.icon,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub async fn find_by_owner<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let owner_row_id = ids::require_user_id(db, owner_id).await?;
        let records = category::Entity::find()
            .filter(category::Column::OwnerId.eq(owner_row_id))
            .order_by_asc(category::Column::Name)
            .order_by_asc(category::Column::Id)
            .all(db)
            .await?;
        Ok(records.into_iter().map(Self::from_model).collect())
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        data: &CreateCategory,
    ) -> Result<Self, DbErr> {
        let owner_row_id = ids::require_user_id(db, owner_id).await?;
        let now = Utc::now();
        let active = category::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            owner_id: Set(owner_row_id),
            name: Set(data.name.clone()),
            color: Set(data.color.clone()),
            icon: Set(data.icon.clone()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }

    /// Deletes an owned category after detaching its todos. Returns the number
    /// of categories removed (0 when not owned or missing).
    pub async fn delete<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<u64, DbErr> {
        let owner_row_id = ids::require_user_id(db, owner_id).await?;
        let Some(category_row_id) = ids::category_id_for_owner(db, id, owner_row_id).await? else {
            return Ok(0);
        };

        todo::Entity::update_many()
            .col_expr(todo::Column::CategoryId, Expr::value(None::<i64>))
            .filter(todo::Column::CategoryId.eq(category_row_id))
            .exec(db)
            .await?;

        let result = category::Entity::delete_many()
            .filter(category::Column::Id.eq(category_row_id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}
