use db::{
    DatabaseConnection,
    models::{
        activity::ActivityType,
        shared_todo::{IncomingShare, Share, SharePermission},
        todo::Todo,
        user::User,
    },
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use super::{
    activity::ActivityRecorder,
    auth::CurrentUser,
    error::ServiceError,
    validation::{ShareTodoRequest, UpdateShareRequest},
};

/// Grants other users view or edit access to a todo.
#[derive(Clone)]
pub struct ShareService {
    db: DatabaseConnection,
    activity: ActivityRecorder,
}

impl ShareService {
    pub fn new(db: DatabaseConnection, activity: ActivityRecorder) -> Self {
        Self { db, activity }
    }

    pub async fn share(
        &self,
        owner: &CurrentUser,
        request: ShareTodoRequest,
    ) -> Result<Share, ServiceError> {
        request.validate()?;
        let permission = request.permission.unwrap_or_default();

        let todo = Todo::find_owned(&self.db, owner.id, request.todo_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Todo not found"))?;
        let grantee = User::find_by_email(&self.db, &request.email)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;
        if grantee.id == owner.id {
            return Err(ServiceError::validation("Cannot share a todo with yourself"));
        }
        if Share::exists(&self.db, todo.id, grantee.id).await? {
            return Err(already_shared());
        }

        let share = Share::create(&self.db, todo.id, grantee.id, permission)
            .await
            .map_err(|err| match ServiceError::from(err) {
                ServiceError::Conflict(_) => already_shared(),
                other => other,
            })?;

        let grantee_label = grantee.name.as_deref().unwrap_or(&grantee.email);
        self.activity
            .record(
                ActivityType::Shared,
                format!("Shared todo \"{}\" with {grantee_label}", todo.title),
                owner.id,
                Some(todo.id),
                Some(json!({
                    "shared_with": grantee.email,
                    "permission": permission,
                })),
            )
            .await;
        tracing::debug!(todo_id = %todo.id, grantee_id = %grantee.id, %permission, "todo shared");

        Ok(share)
    }

    pub async fn update_permission(
        &self,
        owner: &CurrentUser,
        share_id: Uuid,
        request: UpdateShareRequest,
    ) -> Result<Share, ServiceError> {
        Ok(Share::update_permission(&self.db, owner.id, share_id, request.permission).await?)
    }

    pub async fn revoke(&self, owner: &CurrentUser, share_id: Uuid) -> Result<(), ServiceError> {
        match Share::delete(&self.db, owner.id, share_id).await? {
            0 => Err(ServiceError::not_found("Share not found")),
            _ => Ok(()),
        }
    }

    /// Todos other users have shared with the caller, newest grant first.
    pub async fn list_incoming(
        &self,
        user: &CurrentUser,
    ) -> Result<Vec<IncomingShare>, ServiceError> {
        Ok(Share::list_incoming(&self.db, user.id).await?)
    }
}

fn already_shared() -> ServiceError {
    ServiceError::Conflict("Todo already shared with this user".to_string())
}

#[cfg(test)]
mod tests {
    use db::models::{activity::Activity, todo::CreateTodo};

    use super::*;
    use crate::services::test_utils::{setup_db, signed_up};

    fn service(db: &DatabaseConnection) -> ShareService {
        ShareService::new(db.clone(), ActivityRecorder::new(db.clone()))
    }

    async fn owned_todo(db: &DatabaseConnection, owner: &CurrentUser, title: &str) -> Todo {
        Todo::create(
            db,
            owner.id,
            &CreateTodo {
                title: title.to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    fn request(todo_id: Uuid, email: &str) -> ShareTodoRequest {
        ShareTodoRequest {
            todo_id,
            email: email.to_string(),
            permission: None,
        }
    }

    #[tokio::test]
    async fn share_defaults_to_view_and_is_logged() {
        let db = setup_db().await;
        let owner = signed_up(&db, "owner@example.com").await;
        let friend = signed_up(&db, "friend@example.com").await;
        let todo = owned_todo(&db, &owner, "plan trip").await;
        let shares = service(&db);

        let share = shares
            .share(&owner, request(todo.id, "Friend@Example.com"))
            .await
            .unwrap();
        assert_eq!(share.permission, SharePermission::View);
        assert_eq!(share.user_id, friend.id);

        let log = Activity::find_recent_for_user(&db, owner.id, 10).await.unwrap();
        assert_eq!(log[0].activity.activity_type, ActivityType::Shared);
        assert_eq!(
            log[0].activity.description,
            "Shared todo \"plan trip\" with friend"
        );
        assert_eq!(
            log[0].activity.metadata,
            Some(json!({ "shared_with": "friend@example.com", "permission": "VIEW" }))
        );

        let incoming = shares.list_incoming(&friend).await.unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].todo.title, "plan trip");
        assert_eq!(incoming[0].owner.id, owner.id);
    }

    #[tokio::test]
    async fn share_rejects_bad_targets() {
        let db = setup_db().await;
        let owner = signed_up(&db, "owner@example.com").await;
        signed_up(&db, "friend@example.com").await;
        let todo = owned_todo(&db, &owner, "plan trip").await;
        let shares = service(&db);

        let err = shares
            .share(&owner, request(todo.id, "not-an-email"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref msg) if msg == "Invalid email address"));

        let err = shares
            .share(&owner, request(todo.id, "nobody@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref msg) if msg == "User not found"));

        let err = shares
            .share(&owner, request(todo.id, "owner@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        shares
            .share(&owner, request(todo.id, "friend@example.com"))
            .await
            .unwrap();
        let err = shares
            .share(&owner, request(todo.id, "friend@example.com"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, ServiceError::Conflict(ref msg) if msg == "Todo already shared with this user")
        );
    }

    #[tokio::test]
    async fn only_the_owner_manages_a_share() {
        let db = setup_db().await;
        let owner = signed_up(&db, "owner@example.com").await;
        let friend = signed_up(&db, "friend@example.com").await;
        let todo = owned_todo(&db, &owner, "plan trip").await;
        let shares = service(&db);

        let err = shares
            .share(&friend, request(todo.id, "owner@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref msg) if msg == "Todo not found"));

        let share = shares
            .share(&owner, request(todo.id, "friend@example.com"))
            .await
            .unwrap();

        let err = shares.revoke(&friend, share.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref msg) if msg == "Share not found"));
        let err = shares
            .update_permission(
                &friend,
                share.id,
                UpdateShareRequest {
                    permission: SharePermission::Edit,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref msg) if msg == "Share not found"));

        let updated = shares
            .update_permission(
                &owner,
                share.id,
                UpdateShareRequest {
                    permission: SharePermission::Edit,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.permission, SharePermission::Edit);

        shares.revoke(&owner, share.id).await.unwrap();
        assert!(shares.list_incoming(&friend).await.unwrap().is_empty());
    }
}
