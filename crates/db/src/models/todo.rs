use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    category::Category,
    shared_todo::ShareGrant,
    subtask::Subtask,
    tag::Tag,
    user::UserSummary,
};
pub use crate::types::{Priority, TodoStatus};
use crate::{
    entities::{activity, category, shared_todo, subtask, tag, todo, todo_tag, user},
    models::ids,
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Todo {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub status: TodoStatus,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(rename = "order")]
    pub sort_order: i32,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TodoWithRelations {
    #[serde(flatten)]
    #[ts(flatten)]
    pub todo: Todo,
    pub category: Option<Category>,
    pub subtasks: Vec<Subtask>,
    pub tags: Vec<Tag>,
}

impl std::ops::Deref for TodoWithRelations {
    type Target = Todo;
    fn deref(&self) -> &Self::Target {
        &self.todo
    }
}

/// A todo as seen by its owner or a grantee, including who it is shared with.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TodoDetails {
    #[serde(flatten)]
    #[ts(flatten)]
    pub todo: TodoWithRelations,
    pub shared_with: Vec<ShareGrant>,
}

/// Open todo with a due date, paired with its owner for reminder emails.
#[derive(Debug, Clone)]
pub struct DueTodo {
    pub todo: Todo,
    pub owner: UserSummary,
}

#[derive(Debug, Clone, Default)]
pub struct CreateTodo {
    pub title: String,
    pub description: Option<String>,
    pub status: TodoStatus,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
    pub tag_ids: Vec<Uuid>,
}

/// Partial update. Outer `None` leaves a field untouched; for nullable fields
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TodoStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub category_id: Option<Option<Uuid>>,
    pub tag_ids: Option<Vec<Uuid>>,
}

impl UpdateTodo {
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.status.is_some() {
            fields.push("status");
        }
        if self.priority.is_some() {
            fields.push("priority");
        }
        if self.due_date.is_some() {
            fields.push("due_date");
        }
        if self.category_id.is_some() {
            fields.push("category_id");
        }
        if self.tag_ids.is_some() {
            fields.push("tag_ids");
        }
        fields
    }
}

#[derive(Debug, Clone, Default)]
pub struct TodoFilter {
    pub status: Option<TodoStatus>,
    pub priority: Option<Priority>,
    pub category_id: Option<Uuid>,
    pub tag_id: Option<Uuid>,
    pub search: Option<String>,
    pub due_from: Option<DateTime<Utc>>,
    pub due_to: Option<DateTime<Utc>>,
}

/// Case-insensitive substring match on title or description. Folding happens
/// here because SQLite's `LOWER()` only handles ASCII.
fn matches_search(model: &todo::Model, needle: &str) -> bool {
    model.title.to_lowercase().contains(needle)
        || model
            .description
            .as_deref()
            .is_some_and(|description| description.to_lowercase().contains(needle))
}

impl Todo {
    fn from_model(model: todo::Model, owner_id: Uuid, category_id: Option<Uuid>) -> Self {
        Self {
            id: model.uuid,
            owner_id,
            category_id,
            title: model.title,
            description: model.description,
            status: model.status,
            priority: model.priority,
            due_date: model.due_date.map(Into::into),
            sort_order: model.sort_order,
            is_deleted: model.is_deleted,
            deleted_at: model.deleted_at.map(Into::into),
            completed_at: model.completed_at.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    async fn from_single_model<C: ConnectionTrait>(
        db: &C,
        model: todo::Model,
    ) -> Result<Self, DbErr> {
        let owner_id = ids::user_uuid_by_id(db, model.owner_id)
            .await?
            .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
        let category_id = match model.category_id {
            Some(id) => category::Entity::find_by_id(id)
                .one(db)
                .await?
                .map(|category| category.uuid),
            None => None,
        };
        Ok(Self::from_model(model, owner_id, category_id))
    }

    /// Attaches category, ordered subtasks and tags, preserving input order.
    async fn load_relations<C: ConnectionTrait>(
        db: &C,
        models: Vec<todo::Model>,
    ) -> Result<Vec<TodoWithRelations>, DbErr> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let mut owner_ids: Vec<i64> = models.iter().map(|model| model.owner_id).collect();
        owner_ids.sort_unstable();
        owner_ids.dedup();
        let owners: HashMap<i64, Uuid> = user::Entity::find()
            .select_only()
            .column(user::Column::Id)
            .column(user::Column::Uuid)
            .filter(user::Column::Id.is_in(owner_ids))
            .into_tuple::<(i64, Uuid)>()
            .all(db)
            .await?
            .into_iter()
            .collect();

        let category_ids: Vec<i64> = models.iter().filter_map(|model| model.category_id).collect();
        let categories: HashMap<i64, category::Model> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            category::Entity::find()
                .filter(category::Column::Id.is_in(category_ids))
                .all(db)
                .await?
                .into_iter()
                .map(|model| (model.id, model))
                .collect()
        };

        let todo_uuids: HashMap<i64, Uuid> =
            models.iter().map(|model| (model.id, model.uuid)).collect();
        let mut subtasks = Subtask::by_todo_row_ids(db, &todo_uuids).await?;

        let links = todo_tag::Entity::find()
            .filter(todo_tag::Column::TodoId.is_in(todo_uuids.keys().copied().collect::<Vec<_>>()))
            .order_by_asc(todo_tag::Column::Id)
            .all(db)
            .await?;
        let tags: HashMap<i64, tag::Model> = if links.is_empty() {
            HashMap::new()
        } else {
            tag::Entity::find()
                .filter(tag::Column::Id.is_in(links.iter().map(|link| link.tag_id).collect::<Vec<_>>()))
                .all(db)
                .await?
                .into_iter()
                .map(|model| (model.id, model))
                .collect()
        };
        let mut tags_by_todo: HashMap<i64, Vec<Tag>> = HashMap::new();
        for link in links {
            if let Some(tag) = tags.get(&link.tag_id) {
                tags_by_todo
                    .entry(link.todo_id)
                    .or_default()
                    .push(Tag::from_model(tag.clone()));
            }
        }

        let mut result = Vec::with_capacity(models.len());
        for model in models {
            let owner_id = owners
                .get(&model.owner_id)
                .copied()
                .ok_or(DbErr::RecordNotFound("User not found".to_string()))?;
            let category = model
                .category_id
                .and_then(|id| categories.get(&id))
                .cloned()
                .map(Category::from_model);
            let row_id = model.id;
            let todo = Self::from_model(model, owner_id, category.as_ref().map(|c| c.id));
            result.push(TodoWithRelations {
                todo,
                category,
                subtasks: subtasks.remove(&row_id).unwrap_or_default(),
                tags: tags_by_todo.remove(&row_id).unwrap_or_default(),
            });
        }
        Ok(result)
    }

    async fn find_owned_model<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<Option<todo::Model>, DbErr> {
        let owner_row_id = ids::require_user_id(db, owner_id).await?;
        todo::Entity::find()
            .filter(todo::Column::Uuid.eq(id))
            .filter(todo::Column::OwnerId.eq(owner_row_id))
            .one(db)
            .await
    }

    async fn require_owned_model<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<todo::Model, DbErr> {
        Self::find_owned_model(db, owner_id, id)
            .await?
            .ok_or(DbErr::RecordNotFound("Todo not found".to_string()))
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Self>, DbErr> {
        let record = todo::Entity::find()
            .filter(todo::Column::Uuid.eq(id))
            .one(db)
            .await?;
        match record {
            Some(model) => Ok(Some(Self::from_single_model(db, model).await?)),
            None => Ok(None),
        }
    }

    /// Finds a todo owned by `owner_id`, whether or not it is in the trash.
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

    pub async fn find_with_relations<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<TodoWithRelations>, DbErr> {
        let Some(model) = todo::Entity::find()
            .filter(todo::Column::Uuid.eq(id))
            .one(db)
            .await?
        else {
            return Ok(None);
        };
        Ok(Self::load_relations(db, vec![model]).await?.pop())
    }

    /// Visible to the owner and to every grantee; `None` for anyone else.
    pub async fn find_details<C: ConnectionTrait>(
        db: &C,
        viewer_id: Uuid,
        id: Uuid,
    ) -> Result<Option<TodoDetails>, DbErr> {
        let viewer_row_id = ids::require_user_id(db, viewer_id).await?;
        let Some(model) = todo::Entity::find()
            .filter(todo::Column::Uuid.eq(id))
            .one(db)
            .await?
        else {
            return Ok(None);
        };

        if model.owner_id != viewer_row_id {
            let grant = shared_todo::Entity::find()
                .filter(shared_todo::Column::TodoId.eq(model.id))
                .filter(shared_todo::Column::UserId.eq(viewer_row_id))
                .one(db)
                .await?;
            if grant.is_none() {
                return Ok(None);
            }
        }

        let row_id = model.id;
        let Some(todo) = Self::load_relations(db, vec![model]).await?.pop() else {
            return Ok(None);
        };
        let shared_with = ShareGrant::for_todo_row(db, row_id, todo.id).await?;
        Ok(Some(TodoDetails { todo, shared_with }))
    }

    /// Order for a newly created todo: one past the owner's highest active
    /// order, or 0 for the first one.
    async fn next_order<C: ConnectionTrait>(db: &C, owner_row_id: i64) -> Result<i32, DbErr> {
        let last = todo::Entity::find()
            .filter(todo::Column::OwnerId.eq(owner_row_id))
            .filter(todo::Column::IsDeleted.eq(false))
            .order_by_desc(todo::Column::SortOrder)
            .one(db)
            .await?;
        Ok(last.map(|model| model.sort_order + 1).unwrap_or(0))
    }

    async fn replace_tags<C: ConnectionTrait>(
        db: &C,
        todo_row_id: i64,
        tag_row_ids: &[i64],
    ) -> Result<(), DbErr> {
        todo_tag::Entity::delete_many()
            .filter(todo_tag::Column::TodoId.eq(todo_row_id))
            .exec(db)
            .await?;
        if tag_row_ids.is_empty() {
            return Ok(());
        }
        let now = Utc::now();
        let links = tag_row_ids.iter().map(|tag_row_id| todo_tag::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            todo_id: Set(todo_row_id),
            tag_id: Set(*tag_row_id),
            created_at: Set(now.into()),
            ..Default::default()
        });
        todo_tag::Entity::insert_many(links).exec(db).await?;
        Ok(())
    }

    /// Inserts the todo and its tag links. Run inside a transaction so a bad
    /// tag leaves nothing behind.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        data: &CreateTodo,
    ) -> Result<Self, DbErr> {
        let owner_row_id = ids::require_user_id(db, owner_id).await?;
        let category_row_id = match data.category_id {
            Some(uuid) => Some(
                ids::category_id_for_owner(db, uuid, owner_row_id)
                    .await?
                    .ok_or(DbErr::RecordNotFound("Category not found".to_string()))?,
            ),
            None => None,
        };
        let tag_row_ids = ids::tag_ids_for_owner(db, &data.tag_ids, owner_row_id).await?;
        let sort_order = Self::next_order(db, owner_row_id).await?;

        let now = Utc::now();
        let completed_at = (data.status == TodoStatus::Completed).then_some(now);
        let active = todo::ActiveModel {
            uuid: Set(Uuid::new_v4()),
            owner_id: Set(owner_row_id),
            category_id: Set(category_row_id),
            title: Set(data.title.clone()),
            description: Set(data.description.clone()),
            status: Set(data.status),
            priority: Set(data.priority),
            due_date: Set(data.due_date.map(Into::into)),
            sort_order: Set(sort_order),
            is_deleted: Set(false),
            deleted_at: Set(None),
            completed_at: Set(completed_at.map(Into::into)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };
        let model = active.insert(db).await?;
        Self::replace_tags(db, model.id, &tag_row_ids).await?;

        Ok(Self::from_model(model, owner_id, data.category_id))
    }

    pub async fn update<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        id: Uuid,
        data: &UpdateTodo,
    ) -> Result<Self, DbErr> {
        let record = Self::require_owned_model(db, owner_id, id).await?;
        let owner_row_id = record.owner_id;
        let now = Utc::now();

        let tag_row_ids = match &data.tag_ids {
            Some(tag_ids) => Some(ids::tag_ids_for_owner(db, tag_ids, owner_row_id).await?),
            None => None,
        };
        let category_row_id = match data.category_id {
            Some(Some(uuid)) => Some(Some(
                ids::category_id_for_owner(db, uuid, owner_row_id)
                    .await?
                    .ok_or(DbErr::RecordNotFound("Category not found".to_string()))?,
            )),
            Some(None) => Some(None),
            None => None,
        };

        let previous_completed_at = (record.status == TodoStatus::Completed)
            .then_some(record.completed_at)
            .flatten();
        let mut active: todo::ActiveModel = record.into();
        if let Some(title) = data.title.clone() {
            active.title = Set(title);
        }
        if let Some(description) = data.description.clone() {
            active.description = Set(description);
        }
        if let Some(status) = data.status {
            active.status = Set(status);
            active.completed_at = Set(match status {
                TodoStatus::Completed => Some(previous_completed_at.unwrap_or(now.into())),
                _ => None,
            });
        }
        if let Some(priority) = data.priority {
            active.priority = Set(priority);
        }
        if let Some(due_date) = data.due_date {
            active.due_date = Set(due_date.map(Into::into));
        }
        if let Some(category_row_id) = category_row_id {
            active.category_id = Set(category_row_id);
        }
        active.updated_at = Set(now.into());

        let updated = active.update(db).await?;
        if let Some(tag_row_ids) = tag_row_ids {
            Self::replace_tags(db, updated.id, &tag_row_ids).await?;
        }
        Self::from_single_model(db, updated).await
    }

    /// Moves a todo into (`true`) or out of (`false`) the trash.
    pub async fn set_deleted<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        id: Uuid,
        deleted: bool,
    ) -> Result<Self, DbErr> {
        let record = Self::require_owned_model(db, owner_id, id).await?;
        let now = Utc::now();
        let mut active: todo::ActiveModel = record.into();
        active.is_deleted = Set(deleted);
        active.deleted_at = Set(deleted.then_some(now.into()));
        active.updated_at = Set(now.into());
        let updated = active.update(db).await?;
        Self::from_single_model(db, updated).await
    }

    pub async fn reorder<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        id: Uuid,
        new_order: i32,
    ) -> Result<Self, DbErr> {
        let record = Self::require_owned_model(db, owner_id, id).await?;
        let mut active: todo::ActiveModel = record.into();
        active.sort_order = Set(new_order);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(db).await?;
        Self::from_single_model(db, updated).await
    }

    /// Removes child rows of the given todos and detaches their activities.
    async fn delete_children<C: ConnectionTrait>(
        db: &C,
        todo_row_ids: &[i64],
    ) -> Result<(), DbErr> {
        todo_tag::Entity::delete_many()
            .filter(todo_tag::Column::TodoId.is_in(todo_row_ids.to_vec()))
            .exec(db)
            .await?;
        subtask::Entity::delete_many()
            .filter(subtask::Column::TodoId.is_in(todo_row_ids.to_vec()))
            .exec(db)
            .await?;
        shared_todo::Entity::delete_many()
            .filter(shared_todo::Column::TodoId.is_in(todo_row_ids.to_vec()))
            .exec(db)
            .await?;
        activity::Entity::update_many()
            .col_expr(activity::Column::TodoId, Expr::value(None::<i64>))
            .filter(activity::Column::TodoId.is_in(todo_row_ids.to_vec()))
            .exec(db)
            .await?;
        Ok(())
    }

    /// Deletes an owned todo with its subtasks, tag links and shares. Run
    /// inside a transaction.
    pub async fn delete_permanently<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        id: Uuid,
    ) -> Result<u64, DbErr> {
        let Some(record) = Self::find_owned_model(db, owner_id, id).await? else {
            return Ok(0);
        };
        Self::delete_children(db, &[record.id]).await?;
        let result = todo::Entity::delete_by_id(record.id).exec(db).await?;
        Ok(result.rows_affected)
    }

    /// Permanently deletes every trashed todo of the owner. Run inside a
    /// transaction.
    pub async fn delete_trashed<C: ConnectionTrait>(db: &C, owner_id: Uuid) -> Result<u64, DbErr> {
        let owner_row_id = ids::require_user_id(db, owner_id).await?;
        let row_ids: Vec<i64> = todo::Entity::find()
            .select_only()
            .column(todo::Column::Id)
            .filter(todo::Column::OwnerId.eq(owner_row_id))
            .filter(todo::Column::IsDeleted.eq(true))
            .into_tuple()
            .all(db)
            .await?;
        if row_ids.is_empty() {
            return Ok(0);
        }
        Self::delete_children(db, &row_ids).await?;
        let result = todo::Entity::delete_many()
            .filter(todo::Column::Id.is_in(row_ids))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Active todos of the owner matching `filter`, in display order.
    pub async fn list<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
        filter: &TodoFilter,
    ) -> Result<Vec<TodoWithRelations>, DbErr> {
        let owner_row_id = ids::require_user_id(db, owner_id).await?;
        let mut query = todo::Entity::find()
            .filter(todo::Column::OwnerId.eq(owner_row_id))
            .filter(todo::Column::IsDeleted.eq(false));

        if let Some(status) = filter.status {
            query = query.filter(todo::Column::Status.eq(status));
        }
        if let Some(priority) = filter.priority {
            query = query.filter(todo::Column::Priority.eq(priority));
        }
        if let Some(category_id) = filter.category_id {
            let Some(category_row_id) =
                ids::category_id_for_owner(db, category_id, owner_row_id).await?
            else {
                return Ok(Vec::new());
            };
            query = query.filter(todo::Column::CategoryId.eq(category_row_id));
        }
        if let Some(tag_id) = filter.tag_id {
            let Some(tag_row_id) = ids::tag_id_for_owner(db, tag_id, owner_row_id).await? else {
                return Ok(Vec::new());
            };
            let tagged: Vec<i64> = todo_tag::Entity::find()
                .select_only()
                .column(todo_tag::Column::TodoId)
                .filter(todo_tag::Column::TagId.eq(tag_row_id))
                .into_tuple()
                .all(db)
                .await?;
            if tagged.is_empty() {
                return Ok(Vec::new());
            }
            query = query.filter(todo::Column::Id.is_in(tagged));
        }
        if let Some(due_from) = filter.due_from {
            query = query.filter(todo::Column::DueDate.gte(due_from));
        }
        if let Some(due_to) = filter.due_to {
            query = query.filter(todo::Column::DueDate.lte(due_to));
        }

        let mut models = query
            .order_by_asc(todo::Column::SortOrder)
            .order_by_asc(todo::Column::CreatedAt)
            .order_by_asc(todo::Column::Id)
            .all(db)
            .await?;
        if let Some(needle) = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|search| !search.is_empty())
            .map(str::to_lowercase)
        {
            models.retain(|model| matches_search(model, &needle));
        }
        Self::load_relations(db, models).await
    }

    /// Trashed todos of the owner, most recently deleted first.
    pub async fn list_trashed<C: ConnectionTrait>(
        db: &C,
        owner_id: Uuid,
    ) -> Result<Vec<TodoWithRelations>, DbErr> {
        let owner_row_id = ids::require_user_id(db, owner_id).await?;
        let models = todo::Entity::find()
            .filter(todo::Column::OwnerId.eq(owner_row_id))
            .filter(todo::Column::IsDeleted.eq(true))
            .order_by_desc(todo::Column::DeletedAt)
            .order_by_desc(todo::Column::Id)
            .all(db)
            .await?;
        Self::load_relations(db, models).await
    }

    pub(crate) async fn with_relations_by_row_ids<C: ConnectionTrait>(
        db: &C,
        row_ids: Vec<i64>,
    ) -> Result<HashMap<i64, TodoWithRelations>, DbErr> {
        if row_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let models = todo::Entity::find()
            .filter(todo::Column::Id.is_in(row_ids))
            .all(db)
            .await?;
        let row_ids: Vec<i64> = models.iter().map(|model| model.id).collect();
        let loaded = Self::load_relations(db, models).await?;
        Ok(row_ids.into_iter().zip(loaded).collect())
    }

    async fn find_open_due<C: ConnectionTrait>(
        db: &C,
        window: Condition,
    ) -> Result<Vec<DueTodo>, DbErr> {
        let models = todo::Entity::find()
            .filter(todo::Column::IsDeleted.eq(false))
            .filter(todo::Column::Status.ne(TodoStatus::Completed))
            .filter(todo::Column::DueDate.is_not_null())
            .filter(window)
            .order_by_asc(todo::Column::DueDate)
            .order_by_asc(todo::Column::Id)
            .all(db)
            .await?;

        let owners =
            UserSummary::by_row_ids(db, models.iter().map(|model| model.owner_id).collect())
                .await?;
        let mut due = Vec::with_capacity(models.len());
        for model in models {
            let Some(owner) = owners.get(&model.owner_id).cloned() else {
                continue;
            };
            let category_id = match model.category_id {
                Some(id) => category::Entity::find_by_id(id)
                    .one(db)
                    .await?
                    .map(|category| category.uuid),
                None => None,
            };
            due.push(DueTodo {
                todo: Self::from_model(model, owner.id, category_id),
                owner,
            });
        }
        Ok(due)
    }

    /// Open, non-trashed todos whose due date is strictly before `now`.
    pub async fn find_overdue<C: ConnectionTrait>(
        db: &C,
        now: DateTime<Utc>,
    ) -> Result<Vec<DueTodo>, DbErr> {
        Self::find_open_due(db, Condition::all().add(todo::Column::DueDate.lt(now))).await
    }

    /// Open, non-trashed todos due within `[from, to]`.
    pub async fn find_due_between<C: ConnectionTrait>(
        db: &C,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DueTodo>, DbErr> {
        Self::find_open_due(
            db,
            Condition::all()
                .add(todo::Column::DueDate.gte(from))
                .add(todo::Column::DueDate.lte(to)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::models::{
        category::CreateCategory,
        tag::CreateTag,
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
                name: None,
                email: email.to_string(),
                password_hash: "hash".to_string(),
            },
        )
        .await
        .unwrap()
    }

    fn titled(title: &str) -> CreateTodo {
        CreateTodo {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_assigns_increasing_order_per_owner() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice@example.com").await;
        let bob = create_user(&db, "bob@example.com").await;

        let first = Todo::create(&db, alice.id, &titled("one")).await.unwrap();
        let second = Todo::create(&db, alice.id, &titled("two")).await.unwrap();
        let other = Todo::create(&db, bob.id, &titled("bob")).await.unwrap();

        assert_eq!(first.sort_order, 0);
        assert_eq!(second.sort_order, 1);
        assert_eq!(other.sort_order, 0);
        assert_eq!(first.status, TodoStatus::Pending);
        assert_eq!(first.priority, Priority::Medium);
        assert!(first.completed_at.is_none());
    }

    #[tokio::test]
    async fn update_tracks_completion_timestamp() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice@example.com").await;
        let todo = Todo::create(&db, alice.id, &titled("Buy milk")).await.unwrap();

        let completed = Todo::update(
            &db,
            alice.id,
            todo.id,
            &UpdateTodo {
                status: Some(TodoStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let completed_at = completed.completed_at.expect("completed_at set");

        let renamed = Todo::update(
            &db,
            alice.id,
            todo.id,
            &UpdateTodo {
                title: Some("Buy oat milk".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.completed_at, Some(completed_at));

        let reopened = Todo::update(
            &db,
            alice.id,
            todo.id,
            &UpdateTodo {
                status: Some(TodoStatus::InProgress),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(reopened.completed_at.is_none());
    }

    #[tokio::test]
    async fn update_by_non_owner_is_not_found() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice@example.com").await;
        let mallory = create_user(&db, "mallory@example.com").await;
        let todo = Todo::create(&db, alice.id, &titled("private")).await.unwrap();

        let err = Todo::update(
            &db,
            mallory.id,
            todo.id,
            &UpdateTodo {
                title: Some("mine".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DbErr::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn update_replaces_tag_set_and_clears_nullable_fields() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice@example.com").await;
        let work = Tag::create(
            &db,
            alice.id,
            &CreateTag {
                name: "work".to_string(),
                color: "#112233".to_string(),
            },
        )
        .await
        .unwrap();
        let home = Tag::create(
            &db,
            alice.id,
            &CreateTag {
                name: "home".to_string(),
                color: "#445566".to_string(),
            },
        )
        .await
        .unwrap();
        let todo = Todo::create(
            &db,
            alice.id,
            &CreateTodo {
                title: "tagged".to_string(),
                description: Some("details".to_string()),
                tag_ids: vec![work.id],
                ..Default::default()
            },
        )
        .await
        .unwrap();

        Todo::update(
            &db,
            alice.id,
            todo.id,
            &UpdateTodo {
                description: Some(None),
                tag_ids: Some(vec![home.id]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let loaded = Todo::find_with_relations(&db, todo.id).await.unwrap().unwrap();
        assert!(loaded.description.is_none());
        let tag_ids: Vec<Uuid> = loaded.tags.iter().map(|tag| tag.id).collect();
        assert_eq!(tag_ids, vec![home.id]);
    }

    #[tokio::test]
    async fn create_rejects_foreign_category() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice@example.com").await;
        let bob = create_user(&db, "bob@example.com").await;
        let bobs = Category::create(
            &db,
            bob.id,
            &CreateCategory {
                name: "Bob's".to_string(),
                color: "#000000".to_string(),
                icon: None,
            },
        )
        .await
        .unwrap();

        let err = Todo::create(
            &db,
            alice.id,
            &CreateTodo {
                title: "sneaky".to_string(),
                category_id: Some(bobs.id),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DbErr::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn list_filters_and_excludes_trash() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice@example.com").await;
        let urgent = Todo::create(
            &db,
            alice.id,
            &CreateTodo {
                title: "Pay RENT".to_string(),
                priority: Priority::High,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        Todo::create(
            &db,
            alice.id,
            &CreateTodo {
                title: "water plants".to_string(),
                description: Some("the rent-a-plant ones".to_string()),
                priority: Priority::Low,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let trashed = Todo::create(&db, alice.id, &titled("rent receipt")).await.unwrap();
        Todo::set_deleted(&db, alice.id, trashed.id, true).await.unwrap();

        let all = Todo::list(&db, alice.id, &TodoFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let high = Todo::list(
            &db,
            alice.id,
            &TodoFilter {
                priority: Some(Priority::High),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].id, urgent.id);

        let search = Todo::list(
            &db,
            alice.id,
            &TodoFilter {
                search: Some("rent".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(search.len(), 2);
        assert!(search.iter().all(|todo| !todo.is_deleted));

        let wildcard = Todo::list(
            &db,
            alice.id,
            &TodoFilter {
                search: Some("%".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(wildcard.is_empty());
    }

    #[tokio::test]
    async fn search_folds_non_ascii_case() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice@example.com").await;
        let summer = Todo::create(&db, alice.id, &titled("ÉTÉ Plans")).await.unwrap();
        Todo::create(
            &db,
            alice.id,
            &CreateTodo {
                title: "groceries".to_string(),
                description: Some("Crème FRAÎCHE".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let search = |needle: &str| TodoFilter {
            search: Some(needle.to_string()),
            ..Default::default()
        };
        for needle in ["été", "ÉTÉ", "plans"] {
            let found = Todo::list(&db, alice.id, &search(needle)).await.unwrap();
            assert_eq!(found.len(), 1, "search {needle:?}");
            assert_eq!(found[0].id, summer.id);
        }

        let found = Todo::list(&db, alice.id, &search("fraîche")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "groceries");
    }

    #[tokio::test]
    async fn list_orders_by_order_then_creation() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice@example.com").await;
        let a = Todo::create(&db, alice.id, &titled("a")).await.unwrap();
        let b = Todo::create(&db, alice.id, &titled("b")).await.unwrap();
        let c = Todo::create(&db, alice.id, &titled("c")).await.unwrap();

        Todo::reorder(&db, alice.id, c.id, 0).await.unwrap();

        let listed: Vec<Uuid> = Todo::list(&db, alice.id, &TodoFilter::default())
            .await
            .unwrap()
            .iter()
            .map(|todo| todo.id)
            .collect();
        assert_eq!(listed, vec![a.id, c.id, b.id]);
    }

    #[tokio::test]
    async fn delete_trashed_removes_only_trash_and_children() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice@example.com").await;
        let keep = Todo::create(&db, alice.id, &titled("keep")).await.unwrap();
        for title in ["old one", "old two"] {
            let todo = Todo::create(&db, alice.id, &titled(title)).await.unwrap();
            Subtask::create(&db, todo.id, "step").await.unwrap();
            Todo::set_deleted(&db, alice.id, todo.id, true).await.unwrap();
        }

        let removed = Todo::delete_trashed(&db, alice.id).await.unwrap();
        assert_eq!(removed, 2);
        assert!(Todo::list_trashed(&db, alice.id).await.unwrap().is_empty());
        assert_eq!(subtask::Entity::find().all(&db).await.unwrap().len(), 0);
        assert!(Todo::find_by_id(&db, keep.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn overdue_query_skips_completed_trashed_and_future() {
        let db = setup_db().await;
        let alice = create_user(&db, "alice@example.com").await;
        let now = Utc::now();
        let yesterday = now - Duration::days(1);

        let overdue = Todo::create(
            &db,
            alice.id,
            &CreateTodo {
                title: "late".to_string(),
                due_date: Some(yesterday),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        Todo::create(
            &db,
            alice.id,
            &CreateTodo {
                title: "done".to_string(),
                due_date: Some(yesterday),
                status: TodoStatus::Completed,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let trashed = Todo::create(
            &db,
            alice.id,
            &CreateTodo {
                title: "trashed".to_string(),
                due_date: Some(yesterday),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        Todo::set_deleted(&db, alice.id, trashed.id, true).await.unwrap();
        Todo::create(
            &db,
            alice.id,
            &CreateTodo {
                title: "later".to_string(),
                due_date: Some(now + Duration::days(2)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let due = Todo::find_overdue(&db, now).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].todo.id, overdue.id);
        assert_eq!(due[0].owner.email, "alice@example.com");
    }
}
