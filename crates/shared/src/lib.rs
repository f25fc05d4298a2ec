//! # Dodai 共有ユーティリティ
//!
//! このクレートは、Dodai サービス全体で使用されるワイヤ型と
//! 共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - 他のすべてのクレート（infra, api）から依存される
//! - ビジネスロジックを含まない純粋なデータ型のみを配置
//! - axum への依存を持たない（`IntoResponse` 変換は api 側の責務）
//! - observability は feature gate で分離し、ワイヤ型だけの利用者に
//!   tracing スタックを強制しない

pub mod error_response;
pub mod health;
#[cfg(feature = "observability")]
pub mod observability;

pub use error_response::{ErrorResponse, FieldIssue};
pub use health::{CheckStatus, HealthResponse, ReadinessResponse, ReadinessStatus};
