/// Task endpoints
///
/// Every handler runs behind the session gate and only ever touches the
/// caller's own tasks. A task owned by someone else answers exactly like a
/// task that does not exist.
///
/// # Endpoints
///
/// - `POST /api/tasks` - Create (multipart form, optional attachment)
/// - `GET /api/tasks` - List
/// - `PUT /api/tasks/:id` - Toggle completion
/// - `PUT /api/tasks/:id/edit` - Partial edit (JSON)
/// - `DELETE /api/tasks/:id` - Delete
/// - `GET /api/stats` - Counters for the dashboard

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::auth::MessageResponse,
};
use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use taskdesk_shared::{
    auth::middleware::CurrentUser,
    models::task::{CreateTask, EditTask, Task, TaskStats},
    storage::PendingUpload,
    timefmt::parse_iso_datetime,
};
use tracing::{debug, info};
use validator::Validate;

const NOT_FOUND: &str = "Task not found or permission denied!";
const REQUIRED: &str = "Title and priority are required!";

/// Text fields of the create form
///
/// Missing title/priority arrive as empty strings and are reported before
/// these length checks run.
#[derive(Debug, Default, Validate)]
pub struct NewTaskForm {
    #[validate(length(max = 200, message = "Title must be at most 200 characters"))]
    pub title: String,

    #[validate(length(max = 20, message = "Priority must be at most 20 characters"))]
    pub priority: String,

    pub notes: Option<String>,

    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: Option<String>,

    pub due_date: Option<String>,
}

/// List response
#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
}

/// Partial edit body
///
/// For `title`, `priority`, `notes` and `category` an absent key leaves the
/// column alone while an explicit `null` is distinguished from it. `due_date`
/// has no such distinction: absent, `null` and `""` all clear it.
#[derive(Debug, Default, Deserialize)]
pub struct EditTaskRequest {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    pub priority: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    pub notes: Option<Option<String>>,

    #[serde(default, deserialize_with = "present")]
    pub category: Option<Option<String>>,

    #[serde(default)]
    pub due_date: Option<String>,
}

// Wraps a present value (including null) in Some; absent keys hit `default`
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl EditTaskRequest {
    /// Validates the body and turns it into a model update
    pub fn into_edit(self) -> ApiResult<EditTask> {
        let title = required_if_present("title", self.title, 200)?;
        let priority = required_if_present("priority", self.priority, 20)?;

        if let Some(Some(category)) = &self.category {
            if category.chars().count() > 100 {
                return Err(ApiError::validation(
                    "category",
                    "Category must be at most 100 characters",
                ));
            }
        }

        let due_date = match self.due_date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_iso_datetime(raw)?),
            _ => None,
        };

        Ok(EditTask {
            title,
            priority,
            notes: self.notes,
            category: self.category,
            due_date,
        })
    }
}

fn required_if_present(
    field: &str,
    value: Option<Option<String>>,
    max_len: usize,
) -> ApiResult<Option<String>> {
    match value {
        None => Ok(None),
        Some(Some(v)) if !v.is_empty() && v.chars().count() <= max_len => Ok(Some(v)),
        Some(Some(v)) if !v.is_empty() => Err(ApiError::validation(
            field,
            format!("{field} must be at most {max_len} characters"),
        )),
        Some(_) => Err(ApiError::validation(field, format!("{field} cannot be empty"))),
    }
}

/// Create a task
///
/// # Endpoint
///
/// ```text
/// POST /api/tasks
/// Content-Type: multipart/form-data
///
/// title=Pay rent, priority=high, due_date=2024-01-01T00:00:00, attachment=<file>
/// ```
///
/// The whole body is read and validated before anything is written, so a
/// rejected request (400, or 413 over the body limit) leaves no task and no
/// file behind.
///
/// # Errors
///
/// - `400 Bad Request`: Missing title/priority, malformed due date
/// - `413 Payload Too Large`: Body over `MAX_BODY_BYTES`
pub async fn create_task(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    let mut multipart = multipart?;
    let mut form = NewTaskForm::default();
    let mut attachment: Option<PendingUpload> = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "attachment" => {
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await?;
                attachment = Some(PendingUpload::new(file_name, data));
            }
            "title" => form.title = field.text().await?,
            "priority" => form.priority = field.text().await?,
            "notes" => form.notes = non_empty(field.text().await?),
            "category" => form.category = non_empty(field.text().await?),
            "due_date" => form.due_date = non_empty(field.text().await?),
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    if form.title.is_empty() || form.priority.is_empty() {
        return Err(missing_fields(&form));
    }
    form.validate()?;

    let due_date = form
        .due_date
        .as_deref()
        .map(|raw| parse_iso_datetime(raw.trim()))
        .transpose()?;

    let attachment_filename = match attachment {
        Some(upload) => state.uploads.store(upload).await?,
        None => None,
    };

    let task = Task::create(
        &state.db,
        CreateTask {
            user_id: user.id,
            title: form.title,
            priority: form.priority,
            notes: form.notes,
            category: form.category,
            due_date,
            attachment_filename,
        },
    )
    .await?;

    info!(
        user_id = user.id,
        task_id = task.id,
        attachment = ?task.attachment_filename,
        "Task created"
    );

    Ok((
        StatusCode::CREATED,
        MessageResponse::new("Task created successfully!"),
    ))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn missing_fields(form: &NewTaskForm) -> ApiError {
    let details = [("title", &form.title), ("priority", &form.priority)]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| crate::error::ValidationErrorDetail {
            field: field.to_string(),
            message: REQUIRED.to_string(),
        })
        .collect();

    ApiError::ValidationError(details)
}

/// List the caller's tasks in creation order
pub async fn list_tasks(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<TaskListResponse>> {
    let tasks = Task::list_by_owner(&state.db, user.id).await?;

    Ok(Json(TaskListResponse { tasks }))
}

/// Flip a task between complete and to-do
pub async fn toggle_task(
    State(state): State<AppState>,
    user: CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(id) = path?;

    if !Task::toggle_complete(&state.db, user.id, id).await? {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }

    debug!(user_id = user.id, task_id = id, "Task completion toggled");

    Ok(MessageResponse::new("Task marked as complete!"))
}

/// Edit a task
///
/// # Endpoint
///
/// ```text
/// PUT /api/tasks/:id/edit
/// Content-Type: application/json
///
/// { "title": "Pay rent", "notes": null, "due_date": "2024-02-01" }
/// ```
///
/// Only keys present in the body are applied, except `due_date`, which is
/// cleared whenever the body does not carry a non-empty value for it.
///
/// # Errors
///
/// - `400 Bad Request`: Empty title/priority, malformed due date, bad JSON
/// - `404 Not Found`: No such task for this user
pub async fn edit_task(
    State(state): State<AppState>,
    user: CurrentUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<EditTaskRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(id) = path?;
    let Json(req) = payload?;
    let edit = req.into_edit()?;

    if !Task::edit(&state.db, user.id, id, edit).await? {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }

    info!(user_id = user.id, task_id = id, "Task edited");

    Ok(MessageResponse::new("Task updated successfully!"))
}

/// Delete a task
///
/// The attachment file, if any, is left on disk; another task may share it.
pub async fn delete_task(
    State(state): State<AppState>,
    user: CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(id) = path?;

    if !Task::delete(&state.db, user.id, id).await? {
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }

    info!(user_id = user.id, task_id = id, "Task deleted");

    Ok(MessageResponse::new("Task deleted successfully!"))
}

/// Totals plus incomplete tasks per canonical priority
pub async fn get_stats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<TaskStats>> {
    Ok(Json(Task::stats(&state.db, user.id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(json: &str) -> ApiResult<EditTask> {
        serde_json::from_str::<EditTaskRequest>(json).unwrap().into_edit()
    }

    #[test]
    fn test_edit_absent_vs_null() {
        let e = edit(r#"{"notes": null}"#).unwrap();
        assert_eq!(e.notes, Some(None));
        assert_eq!(e.category, None);
        assert_eq!(e.title, None);

        let e = edit(r#"{"category": "work"}"#).unwrap();
        assert_eq!(e.category, Some(Some("work".to_string())));
        assert_eq!(e.notes, None);
    }

    #[test]
    fn test_edit_due_date_rules() {
        assert_eq!(edit("{}").unwrap().due_date, None);
        assert_eq!(edit(r#"{"due_date": null}"#).unwrap().due_date, None);
        assert_eq!(edit(r#"{"due_date": ""}"#).unwrap().due_date, None);

        let e = edit(r#"{"due_date": "2024-03-04T05:06:07"}"#).unwrap();
        assert_eq!(
            e.due_date,
            Some(parse_iso_datetime("2024-03-04T05:06:07").unwrap())
        );

        assert!(matches!(
            edit(r#"{"due_date": "next week"}"#),
            Err(ApiError::ValidationError(_))
        ));
    }

    #[test]
    fn test_edit_rejects_empty_required_fields() {
        for body in [
            r#"{"title": null}"#,
            r#"{"title": ""}"#,
            r#"{"priority": null}"#,
            r#"{"priority": ""}"#,
        ] {
            assert!(
                matches!(edit(body), Err(ApiError::ValidationError(_))),
                "{body}"
            );
        }

        let long_title = format!(r#"{{"title": "{}"}}"#, "x".repeat(201));
        assert!(edit(&long_title).is_err());
    }

    #[test]
    fn test_new_task_form_validation() {
        let form = NewTaskForm {
            title: "Pay rent".to_string(),
            priority: "high".to_string(),
            ..Default::default()
        };
        assert!(form.validate().is_ok());

        let long_category = NewTaskForm {
            category: Some("c".repeat(101)),
            ..form
        };
        assert!(long_category.validate().is_err());
    }

    #[test]
    fn test_missing_fields_names_each_field() {
        let err = missing_fields(&NewTaskForm::default());
        match err {
            ApiError::ValidationError(details) => {
                let fields: Vec<_> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["title", "priority"]);
                assert!(details.iter().all(|d| d.message == REQUIRED));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
