use std::time::Duration;

use chrono::{DateTime, Utc};
use services::services::{error::ServiceError, notification::ScanReport};
use tokio::task::JoinHandle;

use crate::AppState;

/// Reports from one tick of the background scanner.
#[derive(Debug, Default)]
pub struct ScanTick {
    pub overdue: ScanReport,
    pub upcoming: Option<ScanReport>,
}

/// Runs the overdue scan, plus the due-soon scan when it is enabled.
pub async fn run_scans_once(state: &AppState, now: DateTime<Utc>) -> Result<ScanTick, ServiceError> {
    let upcoming_enabled = state.config().read().await.notifications.upcoming_enabled;

    let overdue = state.notifier().scan_overdue(now).await?;
    let upcoming = if upcoming_enabled {
        Some(state.notifier().scan_upcoming(now).await?)
    } else {
        None
    };
    Ok(ScanTick { overdue, upcoming })
}

/// Starts the interval loop, or returns `None` when notifications are off.
pub async fn spawn_notification_scheduler(state: AppState) -> Option<JoinHandle<()>> {
    let (enabled, interval_secs) = {
        let config = state.config().read().await;
        (
            config.notifications.enabled,
            config.notifications.interval_secs,
        )
    };
    if !enabled {
        tracing::info!("Overdue notifications disabled; scheduler not started");
        return None;
    }

    let interval = Duration::from_secs(interval_secs);
    tracing::info!(interval_secs, "Starting overdue notification scheduler");
    Some(tokio::spawn(async move {
        loop {
            match run_scans_once(&state, Utc::now()).await {
                Ok(tick) => {
                    if tick.overdue.total_checked > 0 {
                        tracing::info!(
                            checked = tick.overdue.total_checked,
                            sent = tick.overdue.sent,
                            failed = tick.overdue.failed,
                            skipped = tick.overdue.skipped,
                            "Overdue scan finished"
                        );
                    }
                    if let Some(upcoming) = tick.upcoming.filter(|report| report.total_checked > 0)
                    {
                        tracing::info!(
                            checked = upcoming.total_checked,
                            sent = upcoming.sent,
                            failed = upcoming.failed,
                            "Due-soon scan finished"
                        );
                    }
                }
                Err(err) => tracing::warn!(error = %err, "Overdue scan failed"),
            }
            tokio::time::sleep(interval).await;
        }
    }))
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;
    use services::services::{
        config::{Config, NotificationConfig},
        validation::{CreateTodoRequest, LoginRequest, RegisterRequest},
    };

    use super::*;
    use crate::testing::test_state;

    async fn user_with_overdue_todo(state: &AppState) {
        state
            .auth()
            .register(RegisterRequest {
                name: Some("Ada".to_string()),
                email: "ada@example.com".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();
        let login = state
            .auth()
            .login(LoginRequest {
                email: "ada@example.com".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();
        let user = state.auth().current_user(&login.token).await.unwrap();
        state
            .todos()
            .create(
                &user,
                CreateTodoRequest {
                    title: "file taxes".to_string(),
                    description: None,
                    priority: None,
                    status: None,
                    due_date: Some(Utc::now() - ChronoDuration::days(1)),
                    category_id: None,
                    tag_ids: None,
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn one_tick_sends_overdue_reminders() {
        let state = test_state(Config::default()).await;
        user_with_overdue_todo(&state).await;

        let tick = run_scans_once(&state, Utc::now()).await.unwrap();

        assert_eq!(tick.overdue.total_checked, 1);
        assert_eq!(tick.overdue.sent, 1);
        assert!(tick.upcoming.is_none());
    }

    #[tokio::test]
    async fn upcoming_scan_runs_only_when_enabled() {
        let config = Config {
            notifications: NotificationConfig {
                upcoming_enabled: true,
                ..NotificationConfig::default()
            },
            ..Config::default()
        };
        let state = test_state(config).await;

        let tick = run_scans_once(&state, Utc::now()).await.unwrap();

        assert_eq!(tick.overdue.total_checked, 0);
        assert_eq!(tick.upcoming.map(|report| report.total_checked), Some(0));
    }

    #[tokio::test]
    async fn disabled_notifications_do_not_start_the_loop() {
        let config = Config {
            notifications: NotificationConfig {
                enabled: false,
                ..NotificationConfig::default()
            },
            ..Config::default()
        };
        let state = test_state(config).await;

        assert!(spawn_notification_scheduler(state).await.is_none());
    }
}
