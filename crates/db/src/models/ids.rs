use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::entities::{category, tag, todo, user};

pub async fn user_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    user::Entity::find()
        .select_only()
        .column(user::Column::Id)
        .filter(user::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn user_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    user::Entity::find()
        .select_only()
        .column(user::Column::Uuid)
        .filter(user::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

/// Like [`user_id_by_uuid`] but treats a missing user as an error.
pub async fn require_user_id<C: ConnectionTrait>(db: &C, uuid: Uuid) -> Result<i64, DbErr> {
    user_id_by_uuid(db, uuid)
        .await?
        .ok_or(DbErr::RecordNotFound("User not found".to_string()))
}

pub async fn todo_id_by_uuid<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
) -> Result<Option<i64>, DbErr> {
    todo::Entity::find()
        .select_only()
        .column(todo::Column::Id)
        .filter(todo::Column::Uuid.eq(uuid))
        .into_tuple()
        .one(db)
        .await
}

pub async fn todo_uuid_by_id<C: ConnectionTrait>(
    db: &C,
    id: i64,
) -> Result<Option<Uuid>, DbErr> {
    todo::Entity::find()
        .select_only()
        .column(todo::Column::Uuid)
        .filter(todo::Column::Id.eq(id))
        .into_tuple()
        .one(db)
        .await
}

/// Resolves a category uuid, returning `None` unless `owner_id` owns it.
pub async fn category_id_for_owner<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
    owner_id: i64,
) -> Result<Option<i64>, DbErr> {
    category::Entity::find()
        .select_only()
        .column(category::Column::Id)
        .filter(category::Column::Uuid.eq(uuid))
        .filter(category::Column::OwnerId.eq(owner_id))
        .into_tuple()
        .one(db)
        .await
}

pub async fn tag_id_for_owner<C: ConnectionTrait>(
    db: &C,
    uuid: Uuid,
    owner_id: i64,
) -> Result<Option<i64>, DbErr> {
    tag::Entity::find()
        .select_only()
        .column(tag::Column::Id)
        .filter(tag::Column::Uuid.eq(uuid))
        .filter(tag::Column::OwnerId.eq(owner_id))
        .into_tuple()
        .one(db)
        .await
}

/// Resolves every tag uuid owned by `owner_id`; any foreign or unknown tag is
/// reported as not found.
pub async fn tag_ids_for_owner<C: ConnectionTrait>(
    db: &C,
    uuids: &[Uuid],
    owner_id: i64,
) -> Result<Vec<i64>, DbErr> {
    let mut ids = Vec::with_capacity(uuids.len());
    for uuid in uuids {
        let id = tag_id_for_owner(db, *uuid, owner_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Tag not found".to_string()))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}
