use axum::{
    Extension, Router, extract::State, response::Json as ResponseJson, routing::get,
};
use db::models::todo::TodoWithRelations;
use serde::Serialize;
use services::services::auth::CurrentUser;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct EmptyTrashResponse {
    pub deleted: u64,
}

pub async fn get_trash(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<ResponseJson<ApiResponse<Vec<TodoWithRelations>>>, ApiError> {
    let todos = state.todos().list_trash(&user).await?;
    Ok(ResponseJson(ApiResponse::success(todos)))
}

pub async fn empty_trash(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<ResponseJson<ApiResponse<EmptyTrashResponse>>, ApiError> {
    let deleted = state.todos().empty_trash(&user).await?;
    Ok(ResponseJson(ApiResponse::success(EmptyTrashResponse {
        deleted,
    })))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/trash", get(get_trash).delete(empty_trash))
}
