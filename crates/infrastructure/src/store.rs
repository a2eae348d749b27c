//! ドキュメントストアの抽象
//!
//! コレクション名と ID で指定するキーバリュー＋クエリ型のストアを表します。
//! コネクション管理やリトライはクライアント側の責務で、ここでは扱いません。

use async_trait::async_trait;
use domain::TodoError;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use thiserror::Error;

/// ドキュメント本体（フィールド名 → JSON 値）
pub type Fields = Map<String, Value>;

/// ストアから読み出したドキュメント
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// 書き込み内容
///
/// `server_timestamps` に指定したフィールドはストアが書き込み時刻で埋めます。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentWrite {
    fields: Fields,
    server_timestamps: Vec<String>,
}

impl DocumentWrite {
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            server_timestamps: Vec::new(),
        }
    }

    pub fn with_server_timestamp(mut self, field: impl Into<String>) -> Self {
        self.server_timestamps.push(field.into());
        self
    }

    /// サーバータイムスタンプを確定させたフィールドを返します。
    pub fn resolve(self, timestamp: &str) -> Fields {
        let mut fields = self.fields;
        for name in self.server_timestamps {
            fields.insert(name, Value::String(timestamp.to_string()));
        }
        fields
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("DynamoDB error: {0}")]
    DynamoDb(String),

    #[error("Malformed document: {0}")]
    Malformed(String),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for TodoError {
    fn from(e: StoreError) -> Self {
        TodoError::Storage(e.to_string())
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 新規ドキュメントを追加し、ストアが採番した ID を返す
    async fn add(&self, collection: &str, write: DocumentWrite) -> Result<String, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// 既存ドキュメントへの部分マージ。存在しない場合は `StoreError::NotFound`。
    async fn update(&self, collection: &str, id: &str, write: DocumentWrite)
        -> Result<(), StoreError>;

    /// コレクション全体を `order_by` フィールドの昇順で返す
    async fn list_ordered(&self, collection: &str, order_by: &str)
        -> Result<Vec<Document>, StoreError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

/// `order_by` フィールドの昇順に並べ替える。フィールドを持たないものは先頭、同値は ID 順。
pub fn order_documents(documents: &mut [Document], order_by: &str) {
    documents.sort_by(|a, b| {
        compare_field(a.fields.get(order_by), b.fields.get(order_by)).then_with(|| a.id.cmp(&b.id))
    });
}

fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, value: Value) -> Document {
        let Value::Object(fields) = value else {
            unreachable!()
        };
        Document {
            id: id.to_string(),
            fields,
        }
    }

    #[test]
    fn resolve_fills_server_timestamps() {
        let Value::Object(fields) = json!({ "title": "A" }) else {
            unreachable!()
        };
        let write = DocumentWrite::new(fields)
            .with_server_timestamp("createdAt")
            .with_server_timestamp("updatedAt");

        let resolved = write.resolve("2024-05-01T10:00:00.000000Z");

        assert_eq!(
            Value::Object(resolved),
            json!({
                "title": "A",
                "createdAt": "2024-05-01T10:00:00.000000Z",
                "updatedAt": "2024-05-01T10:00:00.000000Z"
            })
        );
    }

    #[test]
    fn resolve_of_default_write_is_empty() {
        assert!(DocumentWrite::default().resolve("2024-05-01T10:00:00.000000Z").is_empty());
    }

    #[test]
    fn order_documents_sorts_by_field_then_id() {
        let mut docs = vec![
            doc("c", json!({ "createdAt": "2024-05-01T10:00:00.000002Z" })),
            doc("b", json!({ "createdAt": "2024-05-01T10:00:00.000001Z" })),
            doc("a", json!({ "createdAt": "2024-05-01T10:00:00.000002Z" })),
            doc("z", json!({})),
        ];

        order_documents(&mut docs, "createdAt");

        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "b", "a", "c"]);
    }

    #[test]
    fn store_error_becomes_storage_failure() {
        let err: TodoError = StoreError::DynamoDb("throttled".to_string()).into();
        assert_eq!(err, TodoError::Storage("DynamoDB error: throttled".to_string()));
    }
}
