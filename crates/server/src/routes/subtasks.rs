use axum::{
    Extension, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, post},
};
use db::models::subtask::Subtask;
use services::services::auth::CurrentUser;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub async fn toggle_subtask(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(subtask_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Subtask>>, ApiError> {
    let subtask = state.todos().toggle_subtask(&user, subtask_id).await?;
    Ok(ResponseJson(ApiResponse::success(subtask)))
}

pub async fn delete_subtask(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(subtask_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.todos().delete_subtask(&user, subtask_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subtasks/{subtask_id}", delete(delete_subtask))
        .route("/subtasks/{subtask_id}/toggle", post(toggle_subtask))
}
