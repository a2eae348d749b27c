//! Todo サービス
//!
//! `todos` コレクションに対する薄いファサードです。状態はストアへの参照のみを持ち、
//! 各操作はストア呼び出しとレスポンスの整形だけを行います。

use domain::{fields, CreateTodo, DeleteConfirmation, Todo, TodoError, TodoId, TodoResult, UpdateTodo};
use infrastructure::{Document, DocumentStore, DocumentWrite, StoreError};
use std::sync::Arc;
use tracing::info;

pub const COLLECTION: &str = "todos";

#[derive(Clone)]
pub struct TodoService {
    store: Arc<dyn DocumentStore>,
}

impl TodoService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// 作成後に読み直し、ストアが付与した ID とタイムスタンプを返します。
    pub async fn create(&self, input: CreateTodo) -> TodoResult<Todo> {
        let write = DocumentWrite::new(input.to_fields())
            .with_server_timestamp(fields::CREATED_AT)
            .with_server_timestamp(fields::UPDATED_AT);
        let id = self.store.add(COLLECTION, write).await?;

        let todo = match self.store.get(COLLECTION, &id).await? {
            Some(doc) => decode(doc)?,
            None => {
                return Err(TodoError::Storage(format!(
                    "created todo {id} could not be read back"
                )))
            }
        };

        info!(todo_id = %todo.id, "Todo created");
        Ok(todo)
    }

    /// createdAt 昇順の全件
    pub async fn find_all(&self) -> TodoResult<Vec<Todo>> {
        let documents = self
            .store
            .list_ordered(COLLECTION, fields::CREATED_AT)
            .await?;
        documents.into_iter().map(decode).collect()
    }

    pub async fn find_one(&self, id: &str) -> TodoResult<Todo> {
        match self.store.get(COLLECTION, id).await? {
            Some(doc) => decode(doc),
            None => Err(TodoError::not_found(id)),
        }
    }

    /// 部分更新。空のパッチはストアに触れる前に拒否する。
    pub async fn update(&self, id: &str, patch: UpdateTodo) -> TodoResult<Todo> {
        if patch.is_empty() {
            return Err(TodoError::empty_update());
        }

        let write = DocumentWrite::new(patch.to_fields()).with_server_timestamp(fields::UPDATED_AT);
        self.store
            .update(COLLECTION, id, write)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => TodoError::not_found(id),
                other => other.into(),
            })?;

        // マージ直後に削除された場合はここで NotFound になる
        let todo = self.find_one(id).await?;
        info!(todo_id = id, "Todo updated");
        Ok(todo)
    }

    pub async fn remove(&self, id: &str) -> TodoResult<DeleteConfirmation> {
        if self.store.get(COLLECTION, id).await?.is_none() {
            return Err(TodoError::not_found(id));
        }

        self.store.delete(COLLECTION, id).await?;
        info!(todo_id = id, "Todo deleted");
        Ok(DeleteConfirmation::new(TodoId::from_string(id)))
    }
}

fn decode(doc: Document) -> TodoResult<Todo> {
    let Document { id, fields } = doc;
    Todo::from_fields(&id, fields)
        .map_err(|e| TodoError::Storage(format!("malformed todo document {id}: {e}")))
}
