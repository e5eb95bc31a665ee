use db::{
    DatabaseConnection, TransactionTrait,
    models::{
        activity::ActivityType,
        subtask::Subtask,
        todo::{Todo, TodoDetails, TodoWithRelations},
    },
    types::TodoStatus,
};
use serde_json::json;
use uuid::Uuid;

use super::{
    activity::ActivityRecorder,
    auth::CurrentUser,
    error::ServiceError,
    validation::{
        CreateSubtaskRequest, CreateTodoRequest, ReorderTodoRequest, TodoListQuery,
        UpdateTodoRequest,
    },
};

/// Todo lifecycle: create, edit, trash, restore, purge and subtasks.
///
/// Every operation is scoped to the caller; todos owned by someone else are
/// reported as missing.
#[derive(Clone)]
pub struct TodoService {
    db: DatabaseConnection,
    activity: ActivityRecorder,
}

impl TodoService {
    pub fn new(db: DatabaseConnection, activity: ActivityRecorder) -> Self {
        Self { db, activity }
    }

    async fn load(&self, id: Uuid) -> Result<TodoWithRelations, ServiceError> {
        Todo::find_with_relations(&self.db, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Todo not found"))
    }

    pub async fn create(
        &self,
        user: &CurrentUser,
        request: CreateTodoRequest,
    ) -> Result<TodoWithRelations, ServiceError> {
        let data = request.into_record()?;

        let tx = self.db.begin().await?;
        let todo = Todo::create(&tx, user.id, &data).await?;
        tx.commit().await?;

        tracing::debug!(todo_id = %todo.id, user_id = %user.id, "todo created");
        self.activity
            .record(
                ActivityType::Created,
                format!("Created todo \"{}\"", todo.title),
                user.id,
                Some(todo.id),
                Some(json!({ "todo_title": todo.title })),
            )
            .await;

        self.load(todo.id).await
    }

    /// Full view of a todo for its owner or any user it is shared with.
    pub async fn get(&self, user: &CurrentUser, id: Uuid) -> Result<TodoDetails, ServiceError> {
        Todo::find_details(&self.db, user.id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Todo not found"))
    }

    pub async fn update(
        &self,
        user: &CurrentUser,
        id: Uuid,
        request: UpdateTodoRequest,
    ) -> Result<TodoWithRelations, ServiceError> {
        let data = request.into_record()?;
        let changes = data.changed_fields();

        let tx = self.db.begin().await?;
        let todo = Todo::update(&tx, user.id, id, &data).await?;
        tx.commit().await?;

        let (activity_type, verb) = if data.status == Some(TodoStatus::Completed) {
            (ActivityType::Completed, "Completed")
        } else {
            (ActivityType::Updated, "Updated")
        };
        self.activity
            .record(
                activity_type,
                format!("{verb} todo \"{}\"", todo.title),
                user.id,
                Some(todo.id),
                Some(json!({ "todo_title": todo.title, "changes": changes })),
            )
            .await;

        self.load(todo.id).await
    }

    /// Moves the todo to the trash. Subtasks, tags and shares are kept.
    pub async fn soft_delete(&self, user: &CurrentUser, id: Uuid) -> Result<Todo, ServiceError> {
        let todo = Todo::set_deleted(&self.db, user.id, id, true).await?;
        self.activity
            .record(
                ActivityType::Deleted,
                format!("Deleted todo \"{}\"", todo.title),
                user.id,
                Some(todo.id),
                Some(json!({ "todo_title": todo.title })),
            )
            .await;
        Ok(todo)
    }

    pub async fn restore(&self, user: &CurrentUser, id: Uuid) -> Result<Todo, ServiceError> {
        let todo = Todo::set_deleted(&self.db, user.id, id, false).await?;
        self.activity
            .record(
                ActivityType::Restored,
                format!("Restored todo \"{}\"", todo.title),
                user.id,
                Some(todo.id),
                Some(json!({ "todo_title": todo.title })),
            )
            .await;
        Ok(todo)
    }

    /// Removes the todo and everything hanging off it. Not recorded in the
    /// activity log.
    pub async fn permanent_delete(&self, user: &CurrentUser, id: Uuid) -> Result<(), ServiceError> {
        let tx = self.db.begin().await?;
        let removed = Todo::delete_permanently(&tx, user.id, id).await?;
        tx.commit().await?;

        if removed == 0 {
            return Err(ServiceError::not_found("Todo not found"));
        }
        tracing::debug!(todo_id = %id, user_id = %user.id, "todo permanently deleted");
        Ok(())
    }

    pub async fn list(
        &self,
        user: &CurrentUser,
        query: TodoListQuery,
    ) -> Result<Vec<TodoWithRelations>, ServiceError> {
        let filter = query.into_filter()?;
        Ok(Todo::list(&self.db, user.id, &filter).await?)
    }

    pub async fn list_trash(
        &self,
        user: &CurrentUser,
    ) -> Result<Vec<TodoWithRelations>, ServiceError> {
        Ok(Todo::list_trashed(&self.db, user.id).await?)
    }

    /// Sets the display order of one todo. Siblings are not renumbered.
    pub async fn reorder(
        &self,
        user: &CurrentUser,
        id: Uuid,
        request: ReorderTodoRequest,
    ) -> Result<Todo, ServiceError> {
        let new_order = request.into_order()?;
        Ok(Todo::reorder(&self.db, user.id, id, new_order).await?)
    }

    pub async fn empty_trash(&self, user: &CurrentUser) -> Result<u64, ServiceError> {
        let tx = self.db.begin().await?;
        let removed = Todo::delete_trashed(&tx, user.id).await?;
        tx.commit().await?;

        tracing::info!(user_id = %user.id, removed, "trash emptied");
        Ok(removed)
    }

    pub async fn create_subtask(
        &self,
        user: &CurrentUser,
        todo_id: Uuid,
        request: CreateSubtaskRequest,
    ) -> Result<Subtask, ServiceError> {
        let title = request.into_title()?;
        if Todo::find_owned(&self.db, user.id, todo_id).await?.is_none() {
            return Err(ServiceError::not_found("Todo not found"));
        }
        Ok(Subtask::create(&self.db, todo_id, &title).await?)
    }

    pub async fn toggle_subtask(
        &self,
        user: &CurrentUser,
        id: Uuid,
    ) -> Result<Subtask, ServiceError> {
        Ok(Subtask::toggle(&self.db, user.id, id).await?)
    }

    pub async fn delete_subtask(&self, user: &CurrentUser, id: Uuid) -> Result<(), ServiceError> {
        match Subtask::delete(&self.db, user.id, id).await? {
            0 => Err(ServiceError::not_found("Subtask not found")),
            _ => Ok(()),
        }
    }
}
