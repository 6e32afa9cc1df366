use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, FieldError};
use crate::relay::Event;
use crate::state::ApiState;
use pitstop_core::TaskStatus;
use pitstop_db::{NewTask, Task, TaskChanges, TaskFilter};

#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    pub status: Option<String>,
    pub car_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub car_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_mechanic: Option<String>,
    pub points: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub assigned_mechanic: Option<Option<String>>,
    pub points: Option<i64>,
    pub status: Option<String>,
}

pub async fn list_tasks(
    State(state): State<ApiState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let filter = TaskFilter {
        status: query.status,
        car_id: query.car_id,
    };
    let tasks = state.db.list_tasks(&filter).await?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Task>, ApiError> {
    match state.db.get_task(id).await? {
        Some(task) => Ok(Json(task)),
        None => Err(ApiError::NotFound("Task")),
    }
}

pub async fn create_task(
    State(state): State<ApiState>,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let mut errors = Vec::new();

    if payload.car_id.is_none() {
        errors.push(FieldError::new("car_id", "Valid car ID is required"));
    }
    let title = payload.title.unwrap_or_default();
    if title.trim().is_empty() {
        errors.push(FieldError::new("title", "Title is required"));
    }
    if let Some(points) = payload.points {
        if points <= 0 {
            errors.push(FieldError::new("points", "Points must be a positive integer"));
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if let Some(mechanic) = &payload.assigned_mechanic {
        if !state.db.mechanic_exists(mechanic).await? {
            return Err(ApiError::BadRequest("Mechanic not found".to_string()));
        }
    }

    // car_id checked above; a vanished car surfaces as CarMissing from the store
    let car_id = payload.car_id.unwrap_or_default();
    let task = state
        .db
        .create_task(&NewTask {
            car_id,
            title,
            description: payload.description,
            assigned_mechanic: payload.assigned_mechanic,
            points: payload.points.unwrap_or(1),
        })
        .await?;

    state.broadcaster.publish(Event::task_added(&task));

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let mut errors = Vec::new();

    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            errors.push(FieldError::new("title", "Title cannot be empty"));
        }
    }
    if let Some(points) = payload.points {
        if points <= 0 {
            errors.push(FieldError::new("points", "Points must be a positive integer"));
        }
    }
    if let Some(status) = &payload.status {
        if TaskStatus::parse(status).is_none() {
            errors.push(FieldError::new("status", "Invalid status"));
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if let Some(Some(mechanic)) = &payload.assigned_mechanic {
        if !state.db.mechanic_exists(mechanic).await? {
            return Err(ApiError::BadRequest("Mechanic not found".to_string()));
        }
    }

    let changes = TaskChanges {
        title: payload.title,
        description: payload.description,
        assigned_mechanic: payload.assigned_mechanic,
        points: payload.points,
        status: payload.status,
    };
    if changes.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    match state.db.update_task(id, &changes).await? {
        Some(task) => {
            state.broadcaster.publish(Event::task_updated(&task));
            Ok(Json(task))
        }
        None => Err(ApiError::NotFound("Task")),
    }
}

pub async fn delete_task(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    if state.db.delete_task(id).await? {
        state.broadcaster.publish(Event::task_deleted(id));
        Ok(Json(json!({ "message": "Task deleted successfully" })))
    } else {
        Err(ApiError::NotFound("Task"))
    }
}
