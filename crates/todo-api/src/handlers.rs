use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::{CreateTodo, DeleteConfirmation, Todo, UpdateTodo};
use serde::Serialize;

use crate::error::ApiError;
use crate::router::AppState;

#[derive(Debug, Serialize)]
struct HealthBody {
    /// サービスの簡易ステータス
    status: &'static str,
}

/// ヘルスチェック用ハンドラ
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthBody { status: "ok" }))
}

/// POST /todo
pub async fn create_todo(
    State(state): State<AppState>,
    payload: Result<Json<CreateTodo>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let Json(input) = payload?;
    let todo = state.service.create(input).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

/// GET /todo
pub async fn list_todos(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, ApiError> {
    Ok(Json(state.service.find_all().await?))
}

/// GET /todo/:id
pub async fn get_todo(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.service.find_one(&id).await?))
}

/// PATCH /todo/:id
pub async fn patch_todo(
    Path(id): Path<String>,
    State(state): State<AppState>,
    payload: Result<Json<UpdateTodo>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let Json(patch) = payload?;
    Ok(Json(state.service.update(&id, patch).await?))
}

/// DELETE /todo/:id
pub async fn delete_todo(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<DeleteConfirmation>, ApiError> {
    Ok(Json(state.service.remove(&id).await?))
}
