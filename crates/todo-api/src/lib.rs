//! Todo HTTP API（axum）
//!
//! `/todo` 配下の CRUD を `TodoService` 経由でドキュメントストアに中継します。

pub mod error;
pub mod handlers;
pub mod router;
pub mod service;

pub use error::ApiError;
pub use router::{app, app_with_state, AppState};
pub use service::{TodoService, COLLECTION};
