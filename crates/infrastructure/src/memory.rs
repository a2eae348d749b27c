use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use ulid::Ulid;

use crate::clock::ServerClock;
use crate::store::{order_documents, Document, DocumentStore, DocumentWrite, Fields, StoreError};

/// 簡易な InMemory 実装（開発/テスト用）
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<String, HashMap<String, Fields>>>,
    clock: ServerClock,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn add(&self, collection: &str, write: DocumentWrite) -> Result<String, StoreError> {
        let id = Ulid::new().to_string();
        let mut collections = self.collections.write().await;
        // 書き込み順とタイムスタンプ順を揃えるためロック内で発行する
        let fields = write.resolve(&self.clock.now_string());
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);

        debug!(collection, id = %id, "document added");
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            }))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        write: DocumentWrite,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;

        for (name, value) in write.resolve(&self.clock.now_string()) {
            existing.insert(name, value);
        }

        debug!(collection, id, "document updated");
        Ok(())
    }

    async fn list_ordered(
        &self,
        collection: &str,
        order_by: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let mut documents: Vec<Document> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        order_documents(&mut documents, order_by);
        Ok(documents)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }

        debug!(collection, id, "document deleted");
        Ok(())
    }
}
