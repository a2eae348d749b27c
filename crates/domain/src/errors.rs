use thiserror::Error;

/// Todo 操作のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TodoError {
    /// 指定 ID のドキュメントが存在しない（404 相当）
    #[error("Todo with ID \"{0}\" not found")]
    NotFound(String),

    /// 構造的に不正な入力（400 相当）
    #[error("{0}")]
    InvalidArgument(String),

    /// ストア呼び出しの失敗（500 相当）
    #[error("Storage error: {0}")]
    Storage(String),
}

impl TodoError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn empty_update() -> Self {
        Self::InvalidArgument(
            "Update payload cannot be empty. Specify at least one field to update.".to_string(),
        )
    }
}

pub type TodoResult<T> = Result<T, TodoError>;
