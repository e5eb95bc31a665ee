use axum::{
    Router,
    extract::State,
    http::{HeaderMap, Method},
    response::{IntoResponse, Json as ResponseJson, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use services::services::notification::ScanReport;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::ApiError,
    http::auth::{bearer_token, secret_matches, unauthorized},
};

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct OverdueCheckResponse {
    pub message: String,
    #[serde(flatten)]
    #[ts(flatten)]
    pub report: ScanReport,
    pub timestamp: DateTime<Utc>,
}

/// `GET` is the scheduled trigger, `POST` the manual one. Both require
/// `Authorization: Bearer <cron_secret>` when a secret is configured.
pub async fn check_overdue(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let cron_secret = state.config().read().await.cron_secret.clone();
    let authorized = cron_secret
        .as_deref()
        .is_none_or(|expected| {
            bearer_token(&headers).is_some_and(|provided| secret_matches(provided, expected))
        });
    if !authorized {
        tracing::warn!(%method, "rejected cron trigger with a missing or wrong secret");
        return Ok(unauthorized());
    }

    let manual = method == Method::POST;
    tracing::info!(manual, "checking overdue todos");

    let report = state.notifier().scan_overdue(Utc::now()).await?;
    let message = if manual {
        "Manual notification check completed"
    } else {
        "Overdue notifications check completed"
    };
    let response = OverdueCheckResponse {
        message: message.to_string(),
        report,
        timestamp: Utc::now(),
    };
    Ok(ResponseJson(ApiResponse::success(response)).into_response())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/cron/check-overdue", get(check_overdue).post(check_overdue))
}
