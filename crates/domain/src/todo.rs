use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// ドキュメントに保存されるフィールド名
pub mod fields {
    pub const ID: &str = "id";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const IS_COMPLETED: &str = "isCompleted";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// ストアが採番する Todo の識別子
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 永続化された Todo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// ストアの ID とドキュメント本体をマージして Todo を復元します。
    pub fn from_fields(id: &str, mut fields: Map<String, Value>) -> Result<Self, serde_json::Error> {
        fields.insert(fields::ID.to_string(), Value::String(id.to_string()));
        serde_json::from_value(Value::Object(fields))
    }
}

/// POST /todo リクエスト
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl CreateTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            is_completed: None,
        }
    }

    /// 新規ドキュメントのフィールド。isCompleted 未指定時は false。
    /// タイムスタンプはストア側で付与するためここには含めない。
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert(fields::TITLE.to_string(), Value::String(self.title.clone()));
        if let Some(description) = &self.description {
            out.insert(
                fields::DESCRIPTION.to_string(),
                Value::String(description.clone()),
            );
        }
        out.insert(
            fields::IS_COMPLETED.to_string(),
            Value::Bool(self.is_completed.unwrap_or(false)),
        );
        out
    }
}

/// PATCH /todo/:id リクエスト（部分更新）
///
/// `id` やタイムスタンプは更新対象外のため未知フィールドとして拒否します。
/// `description` は `null` を明示するとクリアされます（`Some(None)`）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateTodo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

impl UpdateTodo {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.is_completed.is_none()
    }

    /// 指定されたフィールドのみを含むマージ用フィールド
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut out = Map::new();
        if let Some(title) = &self.title {
            out.insert(fields::TITLE.to_string(), Value::String(title.clone()));
        }
        if let Some(description) = &self.description {
            let value = match description {
                Some(text) => Value::String(text.clone()),
                None => Value::Null,
            };
            out.insert(fields::DESCRIPTION.to_string(), value);
        }
        if let Some(is_completed) = self.is_completed {
            out.insert(fields::IS_COMPLETED.to_string(), Value::Bool(is_completed));
        }
        out
    }
}

// キーが存在すれば値が null でも Some にする
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// DELETE /todo/:id レスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub id: TodoId,
    pub message: String,
}

impl DeleteConfirmation {
    pub fn new(id: TodoId) -> Self {
        let message = format!("Todo with ID \"{id}\" successfully deleted");
        Self { id, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_to_fields_defaults_is_completed_to_false() {
        // Arrange
        let input = CreateTodo::new("Buy milk");

        // Act
        let out = input.to_fields();

        // Assert: description は省略、isCompleted は false
        assert_eq!(
            Value::Object(out),
            json!({ "title": "Buy milk", "isCompleted": false })
        );
    }

    #[test]
    fn create_to_fields_keeps_explicit_values() {
        let input: CreateTodo = serde_json::from_value(json!({
            "title": "Walk dog",
            "description": "around the park",
            "isCompleted": true
        }))
        .unwrap();

        let out = input.to_fields();

        assert_eq!(out["description"], "around the park");
        assert_eq!(out["isCompleted"], true);
        assert!(!out.contains_key("createdAt"));
    }

    #[test]
    fn create_without_title_is_rejected() {
        let result = serde_json::from_value::<CreateTodo>(json!({ "description": "x" }));
        assert!(result.is_err());
    }

    #[test]
    fn empty_update_is_empty() {
        let patch: UpdateTodo = serde_json::from_value(json!({})).unwrap();
        assert!(patch.is_empty());
        assert!(patch.to_fields().is_empty());
    }

    #[test]
    fn null_description_is_a_clearing_patch() {
        // Arrange
        let body = json!({ "description": null });

        // Act
        let patch: UpdateTodo = serde_json::from_value(body).unwrap();

        // Assert: キーがあるので空ではなく、null を書き込む
        assert_eq!(patch.description, Some(None));
        assert!(!patch.is_empty());
        assert_eq!(
            Value::Object(patch.to_fields()),
            json!({ "description": null })
        );
    }

    #[test]
    fn todo_with_null_description_decodes_as_none() {
        let Value::Object(fields) = json!({
            "title": "A",
            "description": null,
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z"
        }) else {
            unreachable!()
        };

        let todo = Todo::from_fields("01HX", fields).unwrap();

        assert_eq!(todo.description, None);
    }

    #[test]
    fn update_rejects_immutable_fields() {
        // id やタイムスタンプは部分更新の対象外
        for body in [
            json!({ "id": "abc" }),
            json!({ "createdAt": "2024-01-01T00:00:00Z" }),
            json!({ "title": "x", "updatedAt": "2024-01-01T00:00:00Z" }),
        ] {
            assert!(serde_json::from_value::<UpdateTodo>(body).is_err());
        }
    }

    #[test]
    fn todo_from_fields_merges_id() {
        let fields = json!({
            "title": "Test Todo",
            "description": "Test",
            "isCompleted": false,
            "createdAt": "2024-05-01T10:00:00.000000Z",
            "updatedAt": "2024-05-01T10:00:00.000001Z"
        });
        let Value::Object(fields) = fields else {
            unreachable!()
        };

        let todo = Todo::from_fields("testId123", fields).unwrap();

        assert_eq!(todo.id.as_str(), "testId123");
        assert_eq!(todo.title, "Test Todo");
        assert_eq!(todo.description.as_deref(), Some("Test"));
        assert!(todo.created_at < todo.updated_at);
    }

    #[test]
    fn todo_from_fields_fails_without_timestamps() {
        let Value::Object(fields) = json!({ "title": "x" }) else {
            unreachable!()
        };
        assert!(Todo::from_fields("id", fields).is_err());
    }

    #[test]
    fn todo_serializes_camel_case_without_missing_description() {
        let Value::Object(fields) = json!({
            "title": "A",
            "isCompleted": true,
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:00:00Z"
        }) else {
            unreachable!()
        };
        let todo = Todo::from_fields("01HX", fields).unwrap();

        let value = serde_json::to_value(&todo).unwrap();

        assert_eq!(value["id"], "01HX");
        assert_eq!(value["isCompleted"], true);
        assert!(value.get("description").is_none());
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn delete_confirmation_embeds_id() {
        let confirmation = DeleteConfirmation::new(TodoId::from_string("testId123"));
        assert_eq!(
            confirmation.message,
            "Todo with ID \"testId123\" successfully deleted"
        );
        assert_eq!(
            serde_json::to_value(&confirmation).unwrap(),
            json!({
                "id": "testId123",
                "message": "Todo with ID \"testId123\" successfully deleted"
            })
        );
    }

    // プロパティベーステスト: 部分更新は指定フィールドのみを書き込む
    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn any_patch() -> impl Strategy<Value = UpdateTodo> {
            (
                proptest::option::of(".{0,32}"),
                proptest::option::of(proptest::option::of(".{0,32}")),
                proptest::option::of(any::<bool>()),
            )
                .prop_map(|(title, description, is_completed)| UpdateTodo {
                    title,
                    description,
                    is_completed,
                })
        }

        proptest! {
            #[test]
            fn patch_fields_match_present_options(patch in any_patch()) {
                let out = patch.to_fields();
                prop_assert_eq!(out.contains_key(fields::TITLE), patch.title.is_some());
                prop_assert_eq!(out.contains_key(fields::DESCRIPTION), patch.description.is_some());
                prop_assert_eq!(out.contains_key(fields::IS_COMPLETED), patch.is_completed.is_some());
                prop_assert_eq!(out.is_empty(), patch.is_empty());
            }

            #[test]
            fn patch_survives_json_round_trip(patch in any_patch()) {
                let json = serde_json::to_value(&patch).unwrap();
                let back: UpdateTodo = serde_json::from_value(json).unwrap();
                prop_assert_eq!(back, patch);
            }
        }
    }
}
