use axum::{
    Extension, Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    response::Json as ResponseJson,
    routing::{delete, get},
};
use db::models::category::Category;
use services::services::{auth::CurrentUser, validation::CreateCategoryRequest};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub async fn get_categories(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<ResponseJson<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = state.catalog().list_categories(&user).await?;
    Ok(ResponseJson(ApiResponse::success(categories)))
}

pub async fn create_category(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<Category>>, ApiError> {
    let Json(payload) = payload?;
    let category = state.catalog().create_category(&user, payload).await?;
    Ok(ResponseJson(ApiResponse::success(category)))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(category_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.catalog().delete_category(&user, category_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(get_categories).post(create_category))
        .route("/categories/{category_id}", delete(delete_category))
}
