use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Number, Value};
use std::collections::HashMap;

use crate::store::{Document, Fields, StoreError};

pub const PK: &str = "PK";
pub const SK: &str = "SK";
pub const DOCUMENT_ID: &str = "id";

/// DynamoDB Single Table Design のキー構造
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentKeys {
    pub pk: String, // パーティションキー（コレクション単位）
    pub sk: String, // ソートキー（ドキュメント単位）
}

impl DocumentKeys {
    pub fn for_document(collection: &str, id: &str) -> Self {
        Self {
            pk: Self::collection_pk(collection),
            sk: format!("DOC#{id}"),
        }
    }

    pub fn collection_pk(collection: &str) -> String {
        format!("COLLECTION#{collection}")
    }

    pub fn into_key(self) -> HashMap<String, AttributeValue> {
        HashMap::from([
            (PK.to_string(), AttributeValue::S(self.pk)),
            (SK.to_string(), AttributeValue::S(self.sk)),
        ])
    }
}

pub fn json_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(json_to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_attribute(v)))
                .collect(),
        ),
    }
}

pub fn attribute_to_json(value: &AttributeValue) -> Result<Value, StoreError> {
    match value {
        AttributeValue::Null(_) => Ok(Value::Null),
        AttributeValue::Bool(b) => Ok(Value::Bool(*b)),
        AttributeValue::S(s) => Ok(Value::String(s.clone())),
        AttributeValue::N(n) => parse_number(n),
        AttributeValue::L(items) => items
            .iter()
            .map(attribute_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        AttributeValue::M(map) => map
            .iter()
            .map(|(k, v)| attribute_to_json(v).map(|v| (k.clone(), v)))
            .collect::<Result<Fields, _>>()
            .map(Value::Object),
        other => Err(StoreError::Malformed(format!(
            "unsupported attribute type: {other:?}"
        ))),
    }
}

fn parse_number(n: &str) -> Result<Value, StoreError> {
    if let Ok(i) = n.parse::<i64>() {
        return Ok(Value::from(i));
    }
    n.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| StoreError::Malformed(format!("invalid number: {n}")))
}

/// ドキュメントを DynamoDB アイテムに変換（キー属性と `id` を付与）
pub fn document_to_item(collection: &str, id: &str, fields: &Fields) -> HashMap<String, AttributeValue> {
    let mut item: HashMap<String, AttributeValue> = fields
        .iter()
        .map(|(k, v)| (k.clone(), json_to_attribute(v)))
        .collect();
    let keys = DocumentKeys::for_document(collection, id);
    item.insert(PK.to_string(), AttributeValue::S(keys.pk));
    item.insert(SK.to_string(), AttributeValue::S(keys.sk));
    item.insert(DOCUMENT_ID.to_string(), AttributeValue::S(id.to_string()));
    item
}

pub fn item_to_document(mut item: HashMap<String, AttributeValue>) -> Result<Document, StoreError> {
    item.remove(PK);
    item.remove(SK);
    let id = match item.remove(DOCUMENT_ID) {
        Some(AttributeValue::S(id)) => id,
        _ => return Err(StoreError::Malformed("missing document id".to_string())),
    };

    let fields = item
        .iter()
        .map(|(k, v)| attribute_to_json(v).map(|v| (k.clone(), v)))
        .collect::<Result<Fields, _>>()?;

    Ok(Document { id, fields })
}
