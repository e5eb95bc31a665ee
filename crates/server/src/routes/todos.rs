use axum::{
    Extension, Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::{
    subtask::Subtask,
    todo::{Todo, TodoDetails, TodoWithRelations},
};
use serde::Deserialize;
use services::services::{
    auth::CurrentUser,
    validation::{
        CreateSubtaskRequest, CreateTodoRequest, ReorderTodoRequest, TodoListQuery,
        UpdateTodoRequest,
    },
};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct DeleteTodoQuery {
    #[serde(default)]
    pub permanent: bool,
}

pub async fn get_todos(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    query: Result<Query<TodoListQuery>, QueryRejection>,
) -> Result<ResponseJson<ApiResponse<Vec<TodoWithRelations>>>, ApiError> {
    let Query(query) = query?;
    let todos = state.todos().list(&user, query).await?;
    Ok(ResponseJson(ApiResponse::success(todos)))
}

pub async fn create_todo(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<TodoWithRelations>>, ApiError> {
    let Json(payload) = payload?;
    let todo = state.todos().create(&user, payload).await?;
    Ok(ResponseJson(ApiResponse::success(todo)))
}

pub async fn get_todo(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(todo_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<TodoDetails>>, ApiError> {
    let todo = state.todos().get(&user, todo_id).await?;
    Ok(ResponseJson(ApiResponse::success(todo)))
}

pub async fn update_todo(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(todo_id): Path<Uuid>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<TodoWithRelations>>, ApiError> {
    let Json(payload) = payload?;
    let todo = state.todos().update(&user, todo_id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(todo)))
}

/// Moves the todo to the trash, or removes it for good with `?permanent=true`.
pub async fn delete_todo(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(todo_id): Path<Uuid>,
    query: Result<Query<DeleteTodoQuery>, QueryRejection>,
) -> Result<ResponseJson<ApiResponse<Option<Todo>>>, ApiError> {
    let Query(query) = query?;
    if query.permanent {
        state.todos().permanent_delete(&user, todo_id).await?;
        return Ok(ResponseJson(ApiResponse::success(None)));
    }
    let todo = state.todos().soft_delete(&user, todo_id).await?;
    Ok(ResponseJson(ApiResponse::success(Some(todo))))
}

pub async fn restore_todo(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(todo_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Todo>>, ApiError> {
    let todo = state.todos().restore(&user, todo_id).await?;
    Ok(ResponseJson(ApiResponse::success(todo)))
}

pub async fn reorder_todo(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(todo_id): Path<Uuid>,
    payload: Result<Json<ReorderTodoRequest>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Todo>>, ApiError> {
    let Json(payload) = payload?;
    let todo = state.todos().reorder(&user, todo_id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(todo)))
}

pub async fn create_subtask(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(todo_id): Path<Uuid>,
    payload: Result<Json<CreateSubtaskRequest>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Subtask>>, ApiError> {
    let Json(payload) = payload?;
    let subtask = state.todos().create_subtask(&user, todo_id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(subtask)))
}

pub fn router() -> Router<AppState> {
    let todo_id_router = Router::new()
        .route("/", get(get_todo).put(update_todo).delete(delete_todo))
        .route("/restore", post(restore_todo))
        .route("/order", put(reorder_todo))
        .route("/subtasks", post(create_subtask));

    let inner = Router::new()
        .route("/", get(get_todos).post(create_todo))
        .nest("/{todo_id}", todo_id_router);

    Router::new().nest("/todos", inner)
}
