use axum::{
    Extension, Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::shared_todo::{IncomingShare, Share};
use services::services::{
    auth::CurrentUser,
    validation::{ShareTodoRequest, UpdateShareRequest},
};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub async fn share_todo(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<ShareTodoRequest>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Share>>, ApiError> {
    let Json(payload) = payload?;
    let share = state.shares().share(&user, payload).await?;
    Ok(ResponseJson(ApiResponse::success(share)))
}

pub async fn update_share(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(share_id): Path<Uuid>,
    payload: Result<Json<UpdateShareRequest>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Share>>, ApiError> {
    let Json(payload) = payload?;
    let share = state
        .shares()
        .update_permission(&user, share_id, payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(share)))
}

pub async fn revoke_share(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(share_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.shares().revoke(&user, share_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn get_incoming_shares(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<ResponseJson<ApiResponse<Vec<IncomingShare>>>, ApiError> {
    let shares = state.shares().list_incoming(&user).await?;
    Ok(ResponseJson(ApiResponse::success(shares)))
}

pub fn router() -> Router<AppState> {
    let inner = Router::new()
        .route("/", post(share_todo))
        .route("/incoming", get(get_incoming_shares))
        .route("/{share_id}", put(update_share).delete(revoke_share));

    Router::new().nest("/shares", inner)
}
