use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use infrastructure::InMemoryDocumentStore;
use std::sync::Arc;
use std::time::Instant;

use crate::handlers;
use crate::service::TodoService;

/// アプリケーションの共有状態
#[derive(Clone)]
pub struct AppState {
    pub service: TodoService,
}

impl AppState {
    pub fn new(service: TodoService) -> Self {
        Self { service }
    }
}

/// InMemory ストアで組み立てたルータ（ローカル確認用）
pub fn app() -> Router {
    let store = Arc::new(InMemoryDocumentStore::new());
    app_with_state(AppState::new(TodoService::new(store)))
}

/// 外部から状態を注入できる版
pub fn app_with_state(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/todo",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/todo/:id",
            get(handlers::get_todo)
                .patch(handlers::patch_todo)
                .delete(handlers::delete_todo),
        )
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = started.elapsed().as_millis() as u64,
        "Request handled"
    );
    response
}
