use async_trait::async_trait;
use aws_config::{retry::RetryConfig, BehaviorVersion};
use aws_sdk_dynamodb::{
    config::Region, error::DisplayErrorContext, types::AttributeValue, Client,
};
use shared::Config;
use tracing::{debug, info};
use ulid::Ulid;

use crate::clock::ServerClock;
use crate::models::{document_to_item, item_to_document, json_to_attribute, DocumentKeys, PK};
use crate::store::{order_documents, Document, DocumentStore, DocumentWrite, StoreError};

/// プロセスで一度だけ生成し、全リクエストで共有する SDK クライアント
#[derive(Clone)]
pub struct DynamoDbClient {
    client: Client,
    table_name: String,
}

impl DynamoDbClient {
    /// 認証情報は SDK のデフォルトプロバイダチェーンから取得する
    pub async fn new(config: &Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()))
            .retry_config(RetryConfig::standard().with_max_attempts(config.retry_max_attempts));

        if let Some(endpoint) = &config.dynamodb_endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let aws_config = loader.load().await;
        info!(
            table = %config.dynamodb_table,
            region = %config.aws_region,
            "DynamoDB client initialized"
        );

        Self::from_parts(Client::new(&aws_config), config.dynamodb_table.clone())
    }

    pub fn from_parts(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

/// DynamoDB 上のドキュメントストア
///
/// コレクションをパーティション（`PK = COLLECTION#<name>`）、ドキュメントを
/// ソートキー（`SK = DOC#<id>`）に割り当て、フィールドはネイティブ属性として保存します。
pub struct DynamoDbDocumentStore {
    db: DynamoDbClient,
    clock: ServerClock,
}

impl DynamoDbDocumentStore {
    pub fn new(db: DynamoDbClient) -> Self {
        Self {
            db,
            clock: ServerClock::new(),
        }
    }
}

fn dynamodb_error<E: std::error::Error>(e: E) -> StoreError {
    StoreError::DynamoDb(DisplayErrorContext(e).to_string())
}

#[async_trait]
impl DocumentStore for DynamoDbDocumentStore {
    async fn add(&self, collection: &str, write: DocumentWrite) -> Result<String, StoreError> {
        let id = Ulid::new().to_string();
        let fields = write.resolve(&self.clock.now_string());
        let item = document_to_item(collection, &id, &fields);

        self.db
            .client()
            .put_item()
            .table_name(self.db.table_name())
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(PK)")
            .send()
            .await
            .map_err(dynamodb_error)?;

        debug!(collection, id = %id, "document added");
        Ok(id)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let output = self
            .db
            .client()
            .get_item()
            .table_name(self.db.table_name())
            .set_key(Some(DocumentKeys::for_document(collection, id).into_key()))
            .consistent_read(true)
            .send()
            .await
            .map_err(dynamodb_error)?;

        output.item.map(item_to_document).transpose()
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        write: DocumentWrite,
    ) -> Result<(), StoreError> {
        let fields = write.resolve(&self.clock.now_string());
        if fields.is_empty() {
            // 書き込む内容がなくても存在確認の結果は返す
            return match self.get(collection, id).await? {
                Some(_) => Ok(()),
                None => Err(StoreError::not_found(collection, id)),
            };
        }

        let mut assignments = Vec::with_capacity(fields.len());
        let mut request = self
            .db
            .client()
            .update_item()
            .table_name(self.db.table_name())
            .set_key(Some(DocumentKeys::for_document(collection, id).into_key()))
            .condition_expression(format!("attribute_exists({PK})"));

        // フィールド名は予約語と衝突しうるため常にプレースホルダを使う
        for (i, (name, value)) in fields.iter().enumerate() {
            assignments.push(format!("#f{i} = :v{i}"));
            request = request
                .expression_attribute_names(format!("#f{i}"), name)
                .expression_attribute_values(format!(":v{i}"), json_to_attribute(value));
        }

        let result = request
            .update_expression(format!("SET {}", assignments.join(", ")))
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!(collection, id, "document updated");
                Ok(())
            }
            Err(e)
                if e.as_service_error()
                    .is_some_and(|se| se.is_conditional_check_failed_exception()) =>
            {
                Err(StoreError::not_found(collection, id))
            }
            Err(e) => Err(dynamodb_error(e)),
        }
    }

    async fn list_ordered(
        &self,
        collection: &str,
        order_by: &str,
    ) -> Result<Vec<Document>, StoreError> {
        let items = self
            .db
            .client()
            .query()
            .table_name(self.db.table_name())
            .key_condition_expression("PK = :pk")
            .expression_attribute_values(
                ":pk",
                AttributeValue::S(DocumentKeys::collection_pk(collection)),
            )
            .consistent_read(true)
            .into_paginator()
            .items()
            .send()
            .collect::<Result<Vec<_>, _>>()
            .await
            .map_err(dynamodb_error)?;

        let mut documents = items
            .into_iter()
            .map(item_to_document)
            .collect::<Result<Vec<_>, _>>()?;
        order_documents(&mut documents, order_by);

        debug!(collection, count = documents.len(), "documents listed");
        Ok(documents)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.db
            .client()
            .delete_item()
            .table_name(self.db.table_name())
            .set_key(Some(DocumentKeys::for_document(collection, id).into_key()))
            .send()
            .await
            .map_err(dynamodb_error)?;

        debug!(collection, id, "document deleted");
        Ok(())
    }
}
