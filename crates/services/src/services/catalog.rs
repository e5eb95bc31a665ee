use db::{
    DatabaseConnection, TransactionTrait,
    models::{
        category::Category,
        tag::Tag,
    },
};
use uuid::Uuid;

use super::{
    auth::CurrentUser,
    error::ServiceError,
    validation::{CreateCategoryRequest, CreateTagRequest},
};

/// Per-user categories and tags used to organise todos.
#[derive(Clone)]
pub struct CatalogService {
    db: DatabaseConnection,
}

impl CatalogService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_categories(&self, user: &CurrentUser) -> Result<Vec<Category>, ServiceError> {
        Ok(Category::find_by_owner(&self.db, user.id).await?)
    }

    pub async fn create_category(
        &self,
        user: &CurrentUser,
        request: CreateCategoryRequest,
    ) -> Result<Category, ServiceError> {
        let data = request.into_record()?;
        Ok(Category::create(&self.db, user.id, &data).await?)
    }

    /// Todos in the category stay, without a category.
    pub async fn delete_category(&self, user: &CurrentUser, id: Uuid) -> Result<(), ServiceError> {
        let tx = self.db.begin().await?;
        let removed = Category::delete(&tx, user.id, id).await?;
        tx.commit().await?;
        match removed {
            0 => Err(ServiceError::not_found("Category not found")),
            _ => Ok(()),
        }
    }

    pub async fn list_tags(&self, user: &CurrentUser) -> Result<Vec<Tag>, ServiceError> {
        Ok(Tag::find_by_owner(&self.db, user.id).await?)
    }

    pub async fn create_tag(
        &self,
        user: &CurrentUser,
        request: CreateTagRequest,
    ) -> Result<Tag, ServiceError> {
        let data = request.into_record()?;
        Ok(Tag::create(&self.db, user.id, &data).await?)
    }

    pub async fn delete_tag(&self, user: &CurrentUser, id: Uuid) -> Result<(), ServiceError> {
        let tx = self.db.begin().await?;
        let removed = Tag::delete(&tx, user.id, id).await?;
        tx.commit().await?;
        match removed {
            0 => Err(ServiceError::not_found("Tag not found")),
            _ => Ok(()),
        }
    }
}
