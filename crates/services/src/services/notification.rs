use chrono::{DateTime, NaiveTime, Utc};
use db::{
    DatabaseConnection,
    models::{
        activity::ActivityType,
        todo::{DueTodo, Todo},
    },
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    activity::ActivityRecorder,
    email::{EmailMessage, SharedTransport},
    error::ServiceError,
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct NotificationResult {
    pub todo_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,
}

/// Outcome of one scan over due todos.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScanReport {
    pub total_checked: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
    pub results: Vec<NotificationResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reminder {
    Overdue,
    DueSoon,
}

impl Reminder {
    fn subject(self, title: &str) -> String {
        match self {
            Reminder::Overdue => format!("⏰ Task Overdue: {title}"),
            Reminder::DueSoon => format!("📅 Task Due Soon: {title}"),
        }
    }

    fn heading(self) -> &'static str {
        match self {
            Reminder::Overdue => "⏰ Task Overdue Reminder",
            Reminder::DueSoon => "📅 Task Due Soon Reminder",
        }
    }

    fn state(self) -> &'static str {
        match self {
            Reminder::Overdue => "overdue",
            Reminder::DueSoon => "due soon",
        }
    }
}

/// Finds open todos past (or close to) their due date and emails the owner.
///
/// Stateless: every call scans again and may remind about the same todo.
#[derive(Clone)]
pub struct OverdueNotifier {
    db: DatabaseConnection,
    transport: SharedTransport,
    activity: ActivityRecorder,
    app_url: String,
}

impl OverdueNotifier {
    pub fn new(
        db: DatabaseConnection,
        transport: SharedTransport,
        activity: ActivityRecorder,
        app_url: impl Into<String>,
    ) -> Self {
        Self {
            db,
            transport,
            activity,
            app_url: app_url.into(),
        }
    }

    pub async fn scan_overdue(&self, now: DateTime<Utc>) -> Result<ScanReport, ServiceError> {
        let due = Todo::find_overdue(&self.db, now).await?;
        tracing::info!(count = due.len(), "checking overdue todos");
        let report = self.dispatch(due, Reminder::Overdue).await;
        tracing::info!(
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            "overdue notification check complete"
        );
        Ok(report)
    }

    /// Reminds about todos due between `now` and the end of the current UTC day.
    pub async fn scan_upcoming(&self, now: DateTime<Utc>) -> Result<ScanReport, ServiceError> {
        let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
            .map(|time| now.date_naive().and_time(time).and_utc())
            .unwrap_or(now);
        let due = Todo::find_due_between(&self.db, now, end_of_day).await?;
        tracing::info!(count = due.len(), "checking todos due soon");
        Ok(self.dispatch(due, Reminder::DueSoon).await)
    }

    async fn dispatch(&self, due: Vec<DueTodo>, reminder: Reminder) -> ScanReport {
        let mut report = ScanReport {
            total_checked: due.len(),
            ..Default::default()
        };

        for DueTodo { todo, owner } in due {
            if owner.email.trim().is_empty() {
                tracing::warn!(todo_id = %todo.id, "skipping reminder, owner has no email");
                report.skipped += 1;
                continue;
            }

            let message = render(&todo, owner.name.as_deref(), &self.app_url, reminder);
            let message = EmailMessage {
                to: owner.email.clone(),
                ..message
            };

            let outcome = self.transport.send(&message).await;
            let error = match outcome {
                Ok(()) => {
                    report.sent += 1;
                    if reminder == Reminder::Overdue {
                        self.activity
                            .record(
                                ActivityType::Updated,
                                format!("Sent overdue notification for \"{}\"", todo.title),
                                owner.id,
                                Some(todo.id),
                                Some(json!({
                                    "notification_type": "overdue",
                                    "sent_at": Utc::now().to_rfc3339(),
                                })),
                            )
                            .await;
                    }
                    None
                }
                Err(err) => {
                    tracing::error!(todo_id = %todo.id, error = %err, "failed to send reminder");
                    report.failed += 1;
                    Some(err.to_string())
                }
            };

            report.results.push(NotificationResult {
                todo_id: todo.id,
                user_id: owner.id,
                email: owner.email,
                success: error.is_none(),
                error,
            });
        }

        report
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Builds the reminder for one todo. `to` is left empty for the caller.
fn render(todo: &Todo, user_name: Option<&str>, app_url: &str, reminder: Reminder) -> EmailMessage {
    let user_name = user_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("there");
    let due = todo
        .due_date
        .map(|due| due.format("%A, %B %-d, %Y").to_string())
        .unwrap_or_default();
    let description = todo
        .description
        .as_deref()
        .map(str::trim)
        .filter(|description| !description.is_empty());
    let priority = todo.priority.to_string();
    let color = todo.priority.color();
    let state = reminder.state();

    let description_html = description
        .map(|description| {
            format!(
                r#"<p style="color: #6b7280; font-size: 14px; line-height: 1.5; margin: 0 0 15px 0;">{}</p>"#,
                escape_html(description)
            )
        })
        .unwrap_or_default();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{heading}</title>
</head>
<body style="margin: 0; padding: 0; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Arial, sans-serif; background-color: #f3f4f6;">
  <table width="100%" cellpadding="0" cellspacing="0" style="background-color: #f3f4f6; padding: 40px 20px;">
    <tr>
      <td align="center">
        <table width="600" cellpadding="0" cellspacing="0" style="background-color: #ffffff; border-radius: 8px; overflow: hidden;">
          <tr>
            <td style="background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); padding: 30px; text-align: center;">
              <h1 style="color: #ffffff; margin: 0; font-size: 24px;">{heading}</h1>
            </td>
          </tr>
          <tr>
            <td style="padding: 40px 30px;">
              <p style="color: #374151; font-size: 16px; margin: 0 0 20px 0;">Hi {name},</p>
              <p style="color: #374151; font-size: 16px; margin: 0 0 30px 0;">This is a reminder that the following task is now <strong style="color: #ef4444;">{state}</strong>:</p>
              <div style="background-color: #f9fafb; border-left: 4px solid {color}; border-radius: 6px; padding: 20px; margin-bottom: 30px;">
                <h2 style="color: #111827; font-size: 18px; margin: 0 0 10px 0;">{title}</h2>
                {description_html}
                <span style="display: inline-block; background-color: {color}; color: #ffffff; padding: 4px 12px; border-radius: 12px; font-size: 12px; font-weight: 600;">{priority} Priority</span>
                <p style="color: #ef4444; font-size: 14px; font-weight: 500; margin: 10px 0 0 0;">📅 Due: {due}</p>
              </div>
              <p style="text-align: center;"><a href="{app_url}/todos" style="display: inline-block; background: #667eea; color: #ffffff; text-decoration: none; padding: 14px 32px; border-radius: 6px; font-weight: 600;">View Task</a></p>
              <p style="color: #6b7280; font-size: 14px; margin: 30px 0 0 0; text-align: center;">Don't forget to mark it as complete when you're done! ✅</p>
            </td>
          </tr>
          <tr>
            <td style="background-color: #f9fafb; padding: 20px 30px; text-align: center; border-top: 1px solid #e5e7eb;">
              <p style="color: #6b7280; font-size: 12px; margin: 0;">You're receiving this email because you have notifications enabled for {state} tasks.<br><a href="{app_url}" style="color: #667eea;">Visit Todo App</a></p>
            </td>
          </tr>
        </table>
      </td>
    </tr>
  </table>
</body>
</html>"#,
        heading = reminder.heading(),
        name = escape_html(user_name),
        state = state,
        color = color,
        title = escape_html(&todo.title),
        description_html = description_html,
        priority = priority,
        due = due,
        app_url = escape_html(app_url),
    );

    let mut text = format!(
        "Hi {user_name},\n\nThis is a reminder that the following task is now {}:\n\nTask: {}\n",
        state.to_uppercase(),
        todo.title
    );
    if let Some(description) = description {
        text.push_str(&format!("Description: {description}\n"));
    }
    text.push_str(&format!(
        "Priority: {priority}\nDue Date: {due}\n\nView your task: {app_url}/todos\n\n\
         Don't forget to mark it as complete when you're done!\n\n---\n\
         You're receiving this email because you have notifications enabled for {state} tasks.\n\
         Visit: {app_url}"
    ));

    EmailMessage {
        to: String::new(),
        subject: reminder.subject(&todo.title),
        html,
        text,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone};
    use db::{
        models::{
            activity::Activity,
            todo::{CreateTodo, UpdateTodo},
        },
        types::{Priority, TodoStatus},
    };

    use super::*;
    use crate::services::test_utils::{RecordingTransport, setup_db, signed_up};

    fn notifier(db: &DatabaseConnection, transport: RecordingTransport) -> OverdueNotifier {
        OverdueNotifier::new(
            db.clone(),
            Arc::new(transport),
            ActivityRecorder::new(db.clone()),
            "https://todo.example.com",
        )
    }

    async fn due_todo(
        db: &DatabaseConnection,
        owner: Uuid,
        title: &str,
        due_date: DateTime<Utc>,
    ) -> Todo {
        Todo::create(
            db,
            owner,
            &CreateTodo {
                title: title.to_string(),
                priority: Priority::High,
                due_date: Some(due_date),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn overdue_todo_is_sent_and_logged() {
        let db = setup_db().await;
        let user = signed_up(&db, "ada@example.com").await;
        let now = Utc::now();
        let todo = due_todo(&db, user.id, "Pay rent", now - Duration::days(1)).await;
        due_todo(&db, user.id, "Later", now + Duration::days(3)).await;

        let transport = RecordingTransport::default();
        let report = notifier(&db, transport.clone())
            .scan_overdue(now)
            .await
            .unwrap();

        assert_eq!(report.total_checked, 1);
        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(report.results[0].todo_id, todo.id);
        assert!(report.results[0].success);

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "ada@example.com");
        assert_eq!(sent[0].subject, "⏰ Task Overdue: Pay rent");
        assert!(sent[0].text.starts_with("Hi ada,"));
        assert!(sent[0].text.contains("now OVERDUE"));
        assert!(sent[0].html.contains("#ef4444"));

        let log = Activity::find_recent_for_user(&db, user.id, 10).await.unwrap();
        let entry = &log[0];
        assert_eq!(entry.activity.activity_type, ActivityType::Updated);
        assert_eq!(entry.activity.todo_id, Some(todo.id));
        assert_eq!(
            entry.activity.description,
            "Sent overdue notification for \"Pay rent\""
        );
        let metadata = entry.activity.metadata.as_ref().unwrap();
        assert_eq!(metadata["notification_type"], "overdue");
        assert!(metadata["sent_at"].is_string());
    }

    #[tokio::test]
    async fn completed_and_trashed_todos_are_ignored() {
        let db = setup_db().await;
        let user = signed_up(&db, "ada@example.com").await;
        let now = Utc::now();
        let done = due_todo(&db, user.id, "done", now - Duration::days(2)).await;
        Todo::update(
            &db,
            user.id,
            done.id,
            &UpdateTodo {
                status: Some(TodoStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let trashed = due_todo(&db, user.id, "trashed", now - Duration::days(2)).await;
        Todo::set_deleted(&db, user.id, trashed.id, true).await.unwrap();

        let report = notifier(&db, RecordingTransport::default())
            .scan_overdue(now)
            .await
            .unwrap();
        assert_eq!(report.total_checked, 0);
        assert!(report.results.is_empty());
    }

    #[tokio::test]
    async fn failed_send_is_counted_without_activity() {
        let db = setup_db().await;
        let ada = signed_up(&db, "ada@example.com").await;
        let bob = signed_up(&db, "bob@example.com").await;
        let now = Utc::now();
        due_todo(&db, ada.id, "ada's", now - Duration::hours(2)).await;
        due_todo(&db, bob.id, "bob's", now - Duration::hours(1)).await;

        let transport = RecordingTransport::failing_for("bob@example.com");
        let report = notifier(&db, transport.clone())
            .scan_overdue(now)
            .await
            .unwrap();

        assert_eq!(report.total_checked, 2);
        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, 1);
        let failure = report.results.iter().find(|r| !r.success).unwrap();
        assert_eq!(failure.email, "bob@example.com");
        assert!(failure.error.is_some());

        assert!(
            Activity::find_recent_for_user(&db, bob.id, 10)
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(
            Activity::find_recent_for_user(&db, ada.id, 10)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn upcoming_scan_covers_rest_of_day_only() {
        let db = setup_db().await;
        let user = signed_up(&db, "ada@example.com").await;
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap();
        due_todo(&db, user.id, "this evening", now + Duration::hours(8)).await;
        due_todo(&db, user.id, "tomorrow", now + Duration::hours(20)).await;
        due_todo(&db, user.id, "this morning", now - Duration::hours(1)).await;

        let transport = RecordingTransport::default();
        let report = notifier(&db, transport.clone())
            .scan_upcoming(now)
            .await
            .unwrap();

        assert_eq!(report.total_checked, 1);
        assert_eq!(report.sent, 1);
        let sent = transport.sent();
        assert_eq!(sent[0].subject, "📅 Task Due Soon: this evening");
        assert!(sent[0].text.contains("now DUE SOON"));
        assert!(
            Activity::find_recent_for_user(&db, user.id, 10)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn render_escapes_user_text_and_formats_due_date() {
        let due = Utc.with_ymd_and_hms(2025, 1, 13, 12, 0, 0).unwrap();
        let todo = Todo {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            category_id: None,
            title: "<script>alert(1)</script>".to_string(),
            description: Some("Fish & chips".to_string()),
            status: TodoStatus::Pending,
            priority: Priority::Low,
            due_date: Some(due),
            sort_order: 0,
            is_deleted: false,
            deleted_at: None,
            completed_at: None,
            created_at: due,
            updated_at: due,
        };

        let message = render(&todo, None, "https://todo.example.com", Reminder::Overdue);
        assert!(message.html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!message.html.contains("<script>"));
        assert!(message.html.contains("Fish &amp; chips"));
        assert!(message.html.contains("Hi there,"));
        assert!(message.html.contains("#3b82f6"));
        assert!(message.text.contains("Due Date: Monday, January 13, 2025"));
        assert!(message.text.contains("View your task: https://todo.example.com/todos"));
    }
}
