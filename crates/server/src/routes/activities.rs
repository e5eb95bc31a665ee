use axum::{
    Extension, Router,
    extract::{Query, State, rejection::QueryRejection},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::activity::ActivityWithTodo;
use serde::Deserialize;
use services::services::auth::CurrentUser;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<u64>,
}

/// Most recent entries first; `limit` is clamped by the recorder.
pub async fn get_activities(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    query: Result<Query<ActivityQuery>, QueryRejection>,
) -> Result<ResponseJson<ApiResponse<Vec<ActivityWithTodo>>>, ApiError> {
    let Query(query) = query?;
    let activities = state.activity().list(&user, query.limit).await?;
    Ok(ResponseJson(ApiResponse::success(activities)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/activities", get(get_activities))
}
