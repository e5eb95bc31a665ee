use sea_orm::{JsonValue, entity::prelude::*};

use crate::types::ActivityType;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "activities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub uuid: Uuid,
    pub user_id: i64,
    pub todo_id: Option<i64>,
    pub activity_type: ActivityType,
    pub description: String,
    pub metadata: Option<JsonValue>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
