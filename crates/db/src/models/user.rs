use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::entities::user;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of another user, embedded in shares and shared todos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: Option<String>,
    pub email: String,
    pub password_hash: String,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    fn from_model(model: user::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            email: model.email,
            email_verified_at: model.email_verified_at.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Uuid.eq(id))
            .one(db)
            .await?;
        Ok(record.map(Self::from_model))
    }

    pub async fn find_by_email<C: ConnectionTrait>(
        db: &C,
        email: &str,
    ) -> Result<Option<Self>, DbErr> {
        Ok(Self::find_with_password_hash(db, email)
            .await?
            .map(|(user, _)| user))
    }

    /// Looks a user up by email together with the stored password hash.
    pub async fn find_with_password_hash<C: ConnectionTrait>(
        db: &C,
        email: &str,
    ) -> Result<Option<(Self, String)>, DbErr> {
        let record = user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(db)
            .await?;
        Ok(record.map(|model| {
            let hash = model.password_hash.clone();
            (Self::from_model(model), hash)
        }))
    }

    pub async fn create<C: ConnectionTrait>(db: &C, data: &CreateUser) -> Result<Self, DbErr> {
        let now = Utc::now();
        let active = user::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            name: Set(data.name.clone()),
            email: Set(normalize_email(&data.email)),
            password_hash: Set(data.password_hash.clone()),
            email_verified_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Ok(Self::from_model(model))
    }
}

impl UserSummary {
    pub(crate) fn from_model(model: user::Model) -> Self {
        Self {
            id: model.uuid,
            name: model.name,
            email: model.email,
        }
    }

    /// Loads summaries keyed by row id.
    pub(crate) async fn by_row_ids<C: ConnectionTrait>(
        db: &C,
        ids: Vec<i64>,
    ) -> Result<HashMap<i64, Self>, DbErr> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let records = user::Entity::find()
            .filter(user::Column::Id.is_in(ids))
            .all(db)
            .await?;
        Ok(records
            .into_iter()
            .map(|model| (model.id, Self::from_model(model)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;

    async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    #[tokio::test]
    async fn email_is_normalized_and_unique() {
        let db = setup_db().await;

        let user = User::create(
            &db,
            &CreateUser {
                name: Some("Ada".to_string()),
                email: "  Ada@Example.COM ".to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(user.email, "ada@example.com");

        let (found, hash) = User::find_with_password_hash(&db, "ADA@example.com")
            .await
            .unwrap()
            .expect("user by email");
        assert_eq!(found.id, user.id);
        assert_eq!(hash, "hash");

        let duplicate = User::create(
            &db,
            &CreateUser {
                name: None,
                email: "ada@example.com".to_string(),
                password_hash: "other".to_string(),
            },
        )
        .await;
        assert!(duplicate.is_err());
    }

    #[test]
    fn serialized_user_has_no_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            name: None,
            email: "a@b.c".to_string(),
            email_verified_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
