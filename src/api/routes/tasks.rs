//! Task hand-out and run control handlers.

use super::{RequestTasksBody, TriggerResponse};
use crate::api::AppState;
use crate::error::Result;
use crate::types::{Stats, TaskView};
use axum::{Json, extract::State};

/// POST /tasks/request - Hand out queued tasks to an agent
#[utoipa::path(
    post,
    path = "/tasks/request",
    tag = "tasks",
    request_body = RequestTasksBody,
    responses(
        (status = 200, description = "Up to `size` tasks in queue order (possibly none)", body = Vec<TaskView>),
        (status = 400, description = "Missing or empty agent", body = crate::error::ApiError),
        (status = 500, description = "Task manager not started", body = crate::error::ApiError)
    )
)]
pub async fn request_tasks(
    State(state): State<AppState>,
    Json(body): Json<RequestTasksBody>,
) -> Result<Json<Vec<TaskView>>> {
    let tasks = state.service.request_tasks(&body.agent, body.size).await?;
    Ok(Json(tasks))
}

/// GET /tasks/stats - Current run statistics
#[utoipa::path(
    get,
    path = "/tasks/stats",
    tag = "tasks",
    responses(
        (status = 200, description = "Run statistics", body = Stats)
    )
)]
pub async fn get_stats(State(state): State<AppState>) -> Json<Stats> {
    Json(state.service.get_stats())
}

/// POST /tasks/trigger - Start a run now unless one is active
#[utoipa::path(
    post,
    path = "/tasks/trigger",
    tag = "tasks",
    responses(
        (status = 200, description = "Whether a run was started", body = TriggerResponse)
    )
)]
pub async fn trigger_run(State(state): State<AppState>) -> Json<TriggerResponse> {
    let started = state.service.manager().trigger_now();
    Json(TriggerResponse { started })
}
