//! todo-api バイナリのエントリポイント

use infrastructure::{DocumentStore, DynamoDbClient, DynamoDbDocumentStore, InMemoryDocumentStore};
use shared::{Config, StoreBackend};
use std::sync::Arc;
use todo_api::{app_with_state, AppState, TodoService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG 環境変数で制御可能
    shared::init_tracing().map_err(|e| anyhow::anyhow!(e))?;

    let config = Config::from_env()?;

    // ストアクライアントは起動時に一度だけ生成して共有する
    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::DynamoDb => {
            let db = DynamoDbClient::new(&config).await;
            Arc::new(DynamoDbDocumentStore::new(db))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store, data is lost on shutdown");
            Arc::new(InMemoryDocumentStore::new())
        }
    };

    let router = app_with_state(AppState::new(TodoService::new(store)));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
