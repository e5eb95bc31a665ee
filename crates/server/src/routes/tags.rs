use axum::{
    Extension, Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    response::Json as ResponseJson,
    routing::{delete, get},
};
use db::models::tag::Tag;
use services::services::{auth::CurrentUser, validation::CreateTagRequest};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub async fn get_tags(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<ResponseJson<ApiResponse<Vec<Tag>>>, ApiError> {
    let tags = state.catalog().list_tags(&user).await?;
    Ok(ResponseJson(ApiResponse::success(tags)))
}

pub async fn create_tag(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<CreateTagRequest>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Tag>>, ApiError> {
    let Json(payload) = payload?;
    let tag = state.catalog().create_tag(&user, payload).await?;
    Ok(ResponseJson(ApiResponse::success(tag)))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(tag_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.catalog().delete_tag(&user, tag_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tags", get(get_tags).post(create_tag))
        .route("/tags/{tag_id}", delete(delete_tag))
}
