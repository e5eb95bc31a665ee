use axum::{
    Extension, Json, Router,
    extract::{State, rejection::JsonRejection},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::user::User;
use services::services::{
    auth::{CurrentUser, LoginResponse},
    validation::{LoginRequest, RegisterRequest},
};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let Json(payload) = payload?;
    let user = state.auth().register(payload).await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ResponseJson<ApiResponse<LoginResponse>>, ApiError> {
    let Json(payload) = payload?;
    let response = state.auth().login(payload).await?;
    Ok(ResponseJson(ApiResponse::success(response)))
}

pub async fn me(
    Extension(user): Extension<CurrentUser>,
) -> Result<ResponseJson<ApiResponse<CurrentUser>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(user)))
}

/// Routes reachable without a token.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/auth/me", get(me))
}
