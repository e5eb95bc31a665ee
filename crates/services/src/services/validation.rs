//! Request payloads for every mutating operation, checked with `validator`
//! and converted into the closed records the `db` crate accepts.

use std::{str::FromStr, sync::LazyLock};

use chrono::{DateTime, Utc};
use db::{
    models::{
        category::CreateCategory,
        tag::CreateTag,
        todo::{CreateTodo, TodoFilter, UpdateTodo},
    },
    types::{Priority, SharePermission, TodoStatus},
};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use super::error::ServiceError;

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap());

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// Message of the first failing field, ordered by field name.
pub fn first_message(errors: &ValidationErrors) -> String {
    let field_errors = errors.field_errors();
    let mut fields: Vec<_> = field_errors.iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));
    fields
        .into_iter()
        .find_map(|(field, errors)| {
            errors.first().map(|error| {
                error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| format!("Invalid {field}"))
            })
        })
        .unwrap_or_else(|| "Invalid fields".to_string())
}

fn trimmed(value: String) -> String {
    value.trim().to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, TS)]
#[ts(export)]
pub struct CreateTodoRequest {
    #[validate(
        custom(function = "not_blank", message = "Title is required"),
        length(max = 200, message = "Title is too long")
    )]
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<TodoStatus>,
    pub due_date: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
    pub tag_ids: Option<Vec<Uuid>>,
}

impl CreateTodoRequest {
    pub fn into_record(mut self) -> Result<CreateTodo, ServiceError> {
        self.title = trimmed(self.title);
        self.validate()?;
        Ok(CreateTodo {
            title: self.title,
            description: self.description,
            status: self.status.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            due_date: self.due_date,
            category_id: self.category_id,
            tag_ids: self.tag_ids.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, TS)]
#[ts(export)]
pub struct UpdateTodoRequest {
    #[validate(
        custom(function = "not_blank", message = "Title is required"),
        length(max = 200, message = "Title is too long")
    )]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub status: Option<TodoStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
    pub tag_ids: Option<Vec<Uuid>>,
}

impl UpdateTodoRequest {
    pub fn into_record(mut self) -> Result<UpdateTodo, ServiceError> {
        self.title = self.title.map(trimmed);
        self.validate()?;
        Ok(UpdateTodo {
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
            category_id: self.category_id,
            tag_ids: self.tag_ids,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, TS)]
#[ts(export)]
pub struct CreateSubtaskRequest {
    #[validate(
        custom(function = "not_blank", message = "Title is required"),
        length(max = 200, message = "Title is too long")
    )]
    pub title: String,
}

impl CreateSubtaskRequest {
    pub fn into_title(mut self) -> Result<String, ServiceError> {
        self.title = trimmed(self.title);
        self.validate()?;
        Ok(self.title)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, TS)]
#[ts(export)]
pub struct CreateCategoryRequest {
    #[validate(
        custom(function = "not_blank", message = "Name is required"),
        length(max = 50, message = "Name is too long")
    )]
    pub name: String,
    #[validate(regex(path = *HEX_COLOR, message = "Invalid color format"))]
    pub color: String,
    pub icon: Option<String>,
}

impl CreateCategoryRequest {
    pub fn into_record(mut self) -> Result<CreateCategory, ServiceError> {
        self.name = trimmed(self.name);
        self.validate()?;
        Ok(CreateCategory {
            name: self.name,
            color: self.color,
            icon: self.icon.map(trimmed).filter(|icon| !icon.is_empty()),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, TS)]
#[ts(export)]
pub struct CreateTagRequest {
    #[validate(
        custom(function = "not_blank", message = "Name is required"),
        length(max = 50, message = "Name is too long")
    )]
    pub name: String,
    #[validate(regex(path = *HEX_COLOR, message = "Invalid color format"))]
    pub color: String,
}

impl CreateTagRequest {
    pub fn into_record(mut self) -> Result<CreateTag, ServiceError> {
        self.name = trimmed(self.name);
        self.validate()?;
        Ok(CreateTag {
            name: self.name,
            color: self.color,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, TS)]
#[ts(export)]
pub struct ReorderTodoRequest {
    #[validate(range(min = 0, message = "Order must be a non-negative integer"))]
    pub new_order: i64,
}

impl ReorderTodoRequest {
    pub fn into_order(self) -> Result<i32, ServiceError> {
        self.validate()?;
        i32::try_from(self.new_order)
            .map_err(|_| ServiceError::validation("Order must be a non-negative integer"))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, TS)]
#[ts(export)]
pub struct ShareTodoRequest {
    pub todo_id: Uuid,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub permission: Option<SharePermission>,
}

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
#[ts(export)]
pub struct UpdateShareRequest {
    pub permission: SharePermission,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, TS)]
#[ts(export)]
pub struct RegisterRequest {
    #[validate(length(max = 100, message = "Name is too long"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, TS)]
#[ts(export)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Raw list filters as they arrive in a query string. `ALL` or an empty
/// value means "no filter".
#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
pub struct TodoListQuery {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category_id: Option<String>,
    pub tag_id: Option<String>,
    pub search: Option<String>,
    pub due_from: Option<DateTime<Utc>>,
    pub due_to: Option<DateTime<Utc>>,
}

fn filter_value(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("ALL"))
}

fn parse_filter<T: FromStr>(raw: Option<&str>, name: &str) -> Result<Option<T>, ServiceError> {
    filter_value(raw)
        .map(|value| {
            T::from_str(&value.to_ascii_uppercase())
                .map_err(|_| ServiceError::validation(format!("Invalid {name} filter")))
        })
        .transpose()
}

fn parse_id_filter(raw: Option<&str>, name: &str) -> Result<Option<Uuid>, ServiceError> {
    filter_value(raw)
        .map(|value| {
            Uuid::parse_str(value)
                .map_err(|_| ServiceError::validation(format!("Invalid {name} filter")))
        })
        .transpose()
}

impl TodoListQuery {
    pub fn into_filter(self) -> Result<TodoFilter, ServiceError> {
        if matches!((self.due_from, self.due_to), (Some(from), Some(to)) if from > to) {
            return Err(ServiceError::validation("Invalid due date range"));
        }
        Ok(TodoFilter {
            status: parse_filter(self.status.as_deref(), "status")?,
            priority: parse_filter(self.priority.as_deref(), "priority")?,
            category_id: parse_id_filter(self.category_id.as_deref(), "category")?,
            tag_id: parse_id_filter(self.tag_id.as_deref(), "tag")?,
            search: self
                .search
                .map(trimmed)
                .filter(|search| !search.is_empty()),
            due_from: self.due_from,
            due_to: self.due_to,
        })
    }
}
