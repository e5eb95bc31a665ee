use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::{todo::TodoWithRelations, user::UserSummary};
pub use crate::types::SharePermission;
use crate::{
    entities::{shared_todo, todo},
    models::{ids, todo::Todo},
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Share {
    pub id: Uuid,
    pub todo_id: Uuid,
    pub user_id: Uuid,
    pub permission: SharePermission,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A grant on one of the caller's todos, with the grantee.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShareGrant {
    #[serde(flatten)]
    #[ts(flatten)]
    pub share: Share,
    pub user: UserSummary,
}

/// A todo someone else shared with the caller.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IncomingShare {
    #[serde(flatten)]
    #[ts(flatten)]
    pub share: Share,
    pub todo: TodoWithRelations,
    pub owner: UserSummary,
}

impl Share {
    fn from_model(model: shared_todo::Model, todo_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: model.uuid,
            todo_id,
            user_id,
            permission: model.permission,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    async fn from_single_model<C: ConnectionTrait>(
        db: &C,
        model: shared_todo::Model,
    ) -> Result<Self, DbErr> {
        let todo_id = ids::todo_uuid_by_id(db, model.todo_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Todo not found".to_string()))?;
        let user_id = ids::user_uuid_by_id(db, model.user_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
        Ok(Self::from_model(model, todo_id, user_id))
    }

    pub async fn exists<C: ConnectionTrait>(
        db: &C,
        todo_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, DbErr> {
        let (Some(todo_row_id), Some(user_row_id)) = (
            ids::todo_id_by_uuid(db, todo_id).await?,
            ids::user_id_by_uuid(db, user_id).await?,
        ) else {
            return Ok(false);
        };
        let record = shared_todo::Entity::find()
            .filter(shared_todo::Column::TodoId.eq(todo_row_id))
            .filter(shared_todo::Column::UserId.eq(user_row_id))
            .one(db)
            .await?;
        Ok(record.is_some())
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        todo_id: Uuid,
        user_id: Uuid,
        permission: SharePermission,
    ) -> Result<Self, DbErr> {
        let todo_row_id = ids::todo_id_by_uuid(db, todo_id)
            .await?
            .ok_or(DbErr::RecordNotFound("Todo not found".to_string()))?;
        let user_row_id = ids::require_user_id(db, user_id).await?;

        let now = Utc::now();
        let active = shared_todo::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            todo_id: Set(todo_row_id),
            user_id: Set(user_row_id),
            permission: Set(permission),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model, todo_id, user_id))
    }

    /// Loads a share only when the shared todo belongs to `owner_id`.
    async fn find_owned_model<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<shared_todo::Model>, DbErr> {
        let owner_row_id = ids::require_user_id(db, owner_id).await?;
        let Some(record) = shared_todo::Entity::find()
            .filter(shared_todo::Column::Uuid.eq(id))
            .one(db)
            .await?
        else {
            return Ok(None);
        };
        let owned = todo::Entity::find_by_id(record.todo_id)
            .filter(todo::Column::OwnerId.eq(owner_row_id))
            .one(db)
            .await?
            .is_some();
        Ok(owned.then_some(record))
    }

    pub async fn find_owned<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, DbErr> {
        match Self::find_owned_model(db, owner_id, id).await? {
            Some(model) => Ok(Some(Self::from_single_model(db, model).await?)),
            None => Ok(None),
        }
    }

    pub async fn update_permission<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        id: Uuid,
        permission: SharePermission,
    ) -> Result<Self, DbErr> {
        let record = Self::find_owned_model(db, owner_id, id)
            .await?
            .ok_or(DbErr::RecordNotFound("Share not found".to_string()))?;
        let mut active: shared_todo::ActiveModel = record.into();
        active.permission = Set(permission);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(db).await?;
        Self::from_single_model(db, updated).await
    }

    pub async fn delete<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<u64, DbErr> {
        let Some(record) = Self::find_owned_model(db, owner_id, id).await? else {
            return Ok(0);
        };
        let result = shared_todo::Entity::delete_by_id(record.id).exec(db).await?;
        Ok(result.rows_affected)
    }

    /// Grants where `user_id` is the grantee, newest first.
    pub async fn list_incoming<C: ConnectionTrait>(
        db: &C,
        user_id: Uuid,
    ) -> Result<Vec<IncomingShare>, DbErr> {
        let user_row_id = ids::require_user_id(db, user_id).await?;
        let records = shared_todo::Entity::find()
            .filter(shared_todo::Column::UserId.eq(user_row_id))
            .order_by_desc(shared_todo::Column::CreatedAt)
            .order_by_desc(shared_todo::Column::Id)
            .all(db)
            .await?;

        let mut todos =
            Todo::with_relations_by_row_ids(db, records.iter().map(|r| r.todo_id).collect())
                .await?;
        let owner_row_ids: Vec<i64> = todo::Entity::find()
            .filter(todo::Column::Id.is_in(records.iter().map(|r| r.todo_id).collect::<Vec<_>>()))
            .all(db)
            .await?
            .into_iter()
            .map(|model| model.owner_id)
            .collect();
        let owners = UserSummary::by_row_ids(db, owner_row_ids).await?;

        let mut incoming = Vec::with_capacity(records.len());
        for record in records {
            let Some(todo) = todos.remove(&record.todo_id) else {
                continue;
            };
            let Some(owner) = owners.values().find(|owner| owner.id == todo.owner_id).cloned()
            else {
                continue;
            };
            let share = Self::from_model(record, todo.id, user_id);
            incoming.push(IncomingShare { share, todo, owner });
        }
        Ok(incoming)
    }
}

impl ShareGrant {
    pub(crate) async fn for_todo_row<C: ConnectionTrait>(
        db: &C,
        todo_row_id: i64,
        todo_id: Uuid,
    ) -> Result<Vec<Self>, DbErr> {
        let records = shared_todo::Entity::find()
            .filter(shared_todo::Column::TodoId.eq(todo_row_id))
            .order_by_asc(shared_todo::Column::CreatedAt)
            .order_by_asc(shared_todo::Column::Id)
            .all(db)
            .await?;
        let users =
            UserSummary::by_row_ids(db, records.iter().map(|r| r.user_id).collect()).await?;

        Ok(records
            .into_iter()
            .filter_map(|record| {
                let user = users.get(&record.user_id)?.clone();
                let share = Share::from_model(record, todo_id, user.id);
                Some(Self { share, user })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::{
        todo::CreateTodo,
        user::{CreateUser, User},
    };

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn create_user(db: &sea_orm::DatabaseConnection, email: &str) -> User {
        User::create(
            db,
            &CreateUser {
                name: Some(email.split('@').next().unwrap_or_default().to_string()),
                email: email.to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn grants_are_unique_and_visible_to_grantee() {
        let db = setup_db().await;
        let owner = create_user(&db, "owner@example.com").await;
        let friend = create_user(&db, "friend@example.com").await;
        let todo = Todo::create(
            &db,
            owner.id,
            &CreateTodo {
                title: "plan trip".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        Share::create(&db, todo.id, friend.id, SharePermission::Edit)
            .await
            .unwrap();
        assert!(Share::exists(&db, todo.id, friend.id).await.unwrap());
        assert!(
            Share::create(&db, todo.id, friend.id, SharePermission::View)
                .await
                .is_err()
        );

        let incoming = Share::list_incoming(&db, friend.id).await.unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].todo.id, todo.id);
        assert_eq!(incoming[0].owner.id, owner.id);
        assert_eq!(incoming[0].share.permission, SharePermission::Edit);

        let details = Todo::find_details(&db, friend.id, todo.id)
            .await
            .unwrap()
            .expect("grantee can see the todo");
        assert_eq!(details.shared_with.len(), 1);
        assert_eq!(details.shared_with[0].user.email, "friend@example.com");
    }

    #[tokio::test]
    async fn only_the_todo_owner_can_change_a_share() {
        let db = setup_db().await;
        let owner = create_user(&db, "owner@example.com").await;
        let friend = create_user(&db, "friend@example.com").await;
        let todo = Todo::create(
            &db,
            owner.id,
            &CreateTodo {
                title: "plan trip".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let share = Share::create(&db, todo.id, friend.id, SharePermission::View)
            .await
            .unwrap();

        let err = Share::update_permission(&db, friend.id, share.id, SharePermission::Edit)
            .await
            .unwrap_err();
        assert!(matches!(err, DbErr::RecordNotFound(_)));
        assert_eq!(Share::delete(&db, friend.id, share.id).await.unwrap(), 0);

        let updated = Share::update_permission(&db, owner.id, share.id, SharePermission::Edit)
            .await
            .unwrap();
        assert_eq!(updated.permission, SharePermission::Edit);
        assert_eq!(Share::delete(&db, owner.id, share.id).await.unwrap(), 1);
        assert!(Todo::find_details(&db, friend.id, todo.id).await.unwrap().is_none());
    }
}
